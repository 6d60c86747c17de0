//! Print the OpenAPI document as JSON.

use backend::doc::ApiDoc;
use std::io::{self, Write as _};
use utoipa::OpenApi;

fn main() -> io::Result<()> {
    let json = ApiDoc::openapi().to_json().map_err(io::Error::other)?;
    writeln!(io::stdout(), "{json}")
}
