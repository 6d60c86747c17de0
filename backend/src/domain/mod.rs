//! Domain primitives, ports, and services.
//!
//! Types here are strongly typed and validated at construction; handlers
//! and adapters never see raw strings where a newtype exists. Services
//! implement the driving ports over the driven ports declared in
//! [`ports`], keeping persistence and HTTP concerns outside the domain.

pub mod credentials;
pub mod dates;
pub mod entry;
pub mod error;
pub mod experience;
pub mod friendship;
pub mod password;
pub mod picture;
pub mod ports;
pub mod user;
pub mod visibility;

mod diary_service;
mod identity_service;
mod media_service;
mod social_service;

pub use self::credentials::{
    CredentialValidationError, LoginCredentials, RegistrationDetails, PASSWORD_MIN_LEN,
};
pub use self::dates::{to_display_date, to_iso_date, EntryDate, InvalidDate};
pub use self::diary_service::DiaryService;
pub use self::entry::{DiaryEntry, EntryId, PrivacyTier};
pub use self::error::{DomainError, ErrorCode, TRACE_ID_HEADER};
pub use self::experience::{Experience, ENTRY_SAVE_AWARD};
pub use self::friendship::{Friendship, FriendshipStatus};
pub use self::identity_service::IdentityService;
pub use self::media_service::MediaService;
pub use self::picture::{Picture, PictureId};
pub use self::social_service::{SocialService, SEARCH_MAX_RESULTS, SEARCH_MIN_LEN};
pub use self::user::{Email, User, UserId, UserValidationError, Username, OAUTH_SENTINEL};
pub use self::visibility::{can_view_entry, FriendshipSnapshot, ViewerIdentity};
