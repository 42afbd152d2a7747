use utoipa::OpenApi;
use crate::common::response::ErrorBody;
use crate::modules::transfer::dto::*;
use crate::modules::transfer::model::JobStatus;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::transfer::handler::submit_transfer,
        crate::modules::transfer::handler::get_status,
        crate::modules::transfer::handler::process_jobs,
    ),
    components(
        schemas(
            TransferRequest, SubmitTransferResponse, JobStatusResponse,
            ProcessResponse, DirectTransferResponse, JobStatus, ErrorBody,
        )
    ),
    tags(
        (name = "Transfer", description = "Video transfer jobs")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cron_secret",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Shared secret from CRON_SECRET"))
                        .build(),
                ),
            );
        }
    }
}
