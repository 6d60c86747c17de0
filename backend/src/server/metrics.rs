//! Request metrics wiring for the diary server.
//!
//! The server only has a Prometheus recorder when the deployment asked for
//! one, yet `App::wrap` bakes the middleware into the app's type. This
//! layer erases that difference: it boxes the inner service whether the
//! recorder is present or not, so `create_server` builds one app shape.

use actix_service::{
    boxed::{self, BoxService},
    Service, ServiceExt as _, Transform,
};
use actix_web::body::BoxBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::PrometheusMetrics;
use futures_util::future::LocalBoxFuture;
use std::sync::Arc;

/// Layer recording per-route request metrics when a recorder is configured.
#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    /// Wrap the optional recorder handed over by the server configuration.
    #[must_use]
    pub(crate) fn new(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self.clone() {
            Self::Enabled(metrics) => {
                let wrapping = Compat::new((*metrics).clone()).new_transform(service);
                Box::pin(async move {
                    let inner = wrapping.await?;
                    Ok(boxed::service(inner))
                })
            }
            Self::Disabled => Box::pin(async move {
                let inner = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
                Ok(boxed::service(inner))
            }),
        }
    }
}
