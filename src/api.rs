use std::path::Path;
use std::sync::Arc;

use rocket::data::Limits;
use rocket::form::{self, DataField, Form, FromFormField};
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{get, post, FromForm, Request, State};
use tracing::warn;

use crate::app_state::AppState;
use crate::diagnosis::ModelState;
use crate::error::{DiagnoseError, PredictError, ReloadError};
use crate::labels::Label;
use crate::types::{
    DiseaseResponse,
    ErrorResponse,
    HealthResponse,
    LoadModelResponse,
    ModelInfoResponse,
    PredictionResponse,
};

/// A multipart file field read fully into memory.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: ContentType,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for ImageUpload {
    async fn from_data(field: DataField<'r, '_>) -> form::Result<'r, Self> {
        let limit = field.request.limits().get("file").unwrap_or(Limits::FILE);
        // raw name only feeds the extension check, it never touches the filesystem
        let file_name = field
            .file_name
            .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string());
        let content_type = field.content_type.clone();

        let bytes = field.data.open(limit).into_bytes().await?;
        if !bytes.is_complete() {
            Err((None, Some(limit)))?;
        }

        Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.into_inner(),
        })
    }
}

#[derive(Debug, FromForm)]
pub struct PredictForm {
    pub file: ImageUpload,
}

/// Error body plus the status it maps to.
#[derive(Debug)]
pub enum ApiError {
    UnsupportedUpload(String),
    Diagnose(DiagnoseError),
    Reload(ReloadError),
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            ApiError::UnsupportedUpload(_) => Status::BadRequest,
            ApiError::Diagnose(DiagnoseError::Predict(err)) => match err {
                PredictError::ModelUnavailable(_) => Status::ServiceUnavailable,
                PredictError::Decode(_) => Status::BadRequest,
                PredictError::Inference(_) => Status::InternalServerError,
            },
            ApiError::Diagnose(DiagnoseError::TimedOut(_)) => Status::GatewayTimeout,
            ApiError::Diagnose(DiagnoseError::Worker(_)) => Status::InternalServerError,
            ApiError::Reload(ReloadError::InProgress) => Status::Conflict,
            ApiError::Reload(_) => Status::ServiceUnavailable,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::UnsupportedUpload(_) => "unsupported_upload",
            ApiError::Diagnose(DiagnoseError::Predict(PredictError::ModelUnavailable(_))) => {
                "model_unavailable"
            }
            ApiError::Diagnose(DiagnoseError::Predict(PredictError::Decode(_))) => "invalid_image",
            ApiError::Diagnose(DiagnoseError::Predict(PredictError::Inference(_))) => {
                "inference_failed"
            }
            ApiError::Diagnose(DiagnoseError::TimedOut(_)) => "timeout",
            ApiError::Diagnose(DiagnoseError::Worker(_)) => "internal",
            ApiError::Reload(ReloadError::InProgress) => "load_in_progress",
            ApiError::Reload(_) => "model_load_failed",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::UnsupportedUpload(msg) => msg.clone(),
            ApiError::Diagnose(err) => err.to_string(),
            ApiError::Reload(err) => err.to_string(),
        }
    }
}

impl From<DiagnoseError> for ApiError {
    fn from(err: DiagnoseError) -> Self {
        ApiError::Diagnose(err)
    }
}

impl From<ReloadError> for ApiError {
    fn from(err: ReloadError) -> Self {
        ApiError::Reload(err)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            warn!(status = status.code, error = %self.message(), "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.message(),
        });
        (status, body).respond_to(req)
    }
}

#[get("/health")]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[post("/api/predict", data = "<form>")]
pub async fn predict(
    state: &State<Arc<AppState>>,
    form: Form<PredictForm>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let upload = form.into_inner().file;

    match upload.extension() {
        Some(ext) if state.config().allows_extension(ext) => {}
        _ => {
            return Err(ApiError::UnsupportedUpload(format!(
                "invalid file type `{}` ({}), allowed: {}",
                upload.file_name.as_deref().unwrap_or("<unnamed>"),
                upload.content_type,
                state.config().allowed_extensions.join(", ")
            )))
        }
    }

    let result = state.diagnose(upload.bytes).await?;
    Ok(Json(result.into()))
}

#[get("/model")]
pub async fn model_info(state: &State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let mut resp = ModelInfoResponse {
        status: String::new(),
        source: state.config().model_source().to_string(),
        device: None,
        num_classes: None,
        bound_parameters: None,
        missing_parameters: Vec::new(),
        unexpected_parameters: Vec::new(),
        reason: None,
    };

    match state.model() {
        ModelState::Loading => resp.status = "loading".to_string(),
        ModelState::Unavailable { reason } => {
            resp.status = "unavailable".to_string();
            resp.reason = Some(reason);
        }
        ModelState::Ready(handle) => {
            let report = handle.report();
            resp.status = "ready".to_string();
            resp.source = handle.source().to_string();
            resp.device = Some(format!("{:?}", handle.device()));
            resp.num_classes = Some(handle.num_classes());
            resp.bound_parameters = Some(report.bound);
            resp.missing_parameters = report.missing.clone();
            resp.unexpected_parameters = report.unexpected.clone();
        }
    }

    Json(resp)
}

#[post("/model/load")]
pub async fn load_model(
    state: &State<Arc<AppState>>,
) -> Result<Json<LoadModelResponse>, ApiError> {
    let handle = state.load_model().await?;
    Ok(Json(LoadModelResponse {
        status: "ready".to_string(),
        message: format!(
            "loaded {} classes from {}",
            handle.num_classes(),
            handle.source()
        ),
    }))
}

#[get("/labels")]
pub async fn labels() -> Json<Vec<DiseaseResponse>> {
    Json(Label::ALL.into_iter().map(DiseaseResponse::from).collect())
}

#[get("/diseases/<name>")]
pub async fn disease(name: &str) -> Json<DiseaseResponse> {
    Json(DiseaseResponse::for_name(name))
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageFormat};
    use rocket::figment::Figment;
    use rocket::local::blocking::{Client, LocalResponse};

    use super::*;
    use crate::config::ServiceConfig;
    use crate::knowledge::DiseaseInfo;
    use crate::labels::LABEL_COUNT;
    use crate::loader::tests::random_handle;
    use crate::preprocess::tests::{encode, gradient};
    use crate::server;

    const BOUNDARY: &str = "leaf-diagnosis-test-boundary";

    fn client(model: ModelState) -> Client {
        let config = ServiceConfig {
            image_size: 32,
            ..ServiceConfig::default()
        };
        let figment = Figment::from(rocket::Config::debug_default()).merge(("log_level", "off"));
        Client::tracked(server::build(figment, AppState::with_model(config, model))).unwrap()
    }

    fn multipart(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post_file<'c>(client: &'c Client, file_name: &str, bytes: &[u8]) -> LocalResponse<'c> {
        client
            .post("/api/predict")
            .header(ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY)))
            .body(multipart(file_name, bytes))
            .dispatch()
    }

    fn leaf_png() -> Vec<u8> {
        encode(DynamicImage::ImageRgb8(gradient(48, 40)), ImageFormat::Png)
    }

    fn unavailable() -> ModelState {
        ModelState::Unavailable {
            reason: "weights missing".to_string(),
        }
    }

    #[test]
    fn health_is_ok_without_model() {
        let client = client(unavailable());
        let resp = client.get("/health").dispatch();
        assert_eq!(resp.status(), Status::Ok);
        assert_eq!(resp.into_json::<HealthResponse>().unwrap().status, "ok");
    }

    #[test]
    fn predict_returns_catalog_label() {
        let client = client(ModelState::Ready(Arc::new(random_handle())));
        let resp = post_file(&client, "leaf.png", &leaf_png());
        assert_eq!(resp.status(), Status::Ok);

        let body = resp.into_json::<PredictionResponse>().unwrap();
        let label: Label = body.label.parse().unwrap();
        assert!((0.0..=1.0).contains(&body.confidence));
        assert_eq!(body.description, label.info().description);
        assert_eq!(body.remedy, label.info().remedy);
    }

    #[test]
    fn predict_without_model_is_503() {
        let client = client(unavailable());
        let resp = post_file(&client, "leaf.png", &leaf_png());
        assert_eq!(resp.status(), Status::ServiceUnavailable);

        let body = resp.into_json::<ErrorResponse>().unwrap();
        assert_eq!(body.error, "model_unavailable");
        assert!(body.message.contains("weights missing"));
    }

    #[test]
    fn predict_rejects_unlisted_extension() {
        let client = client(ModelState::Ready(Arc::new(random_handle())));
        let resp = post_file(&client, "leaf.gif", &leaf_png());
        assert_eq!(resp.status(), Status::BadRequest);
        assert_eq!(
            resp.into_json::<ErrorResponse>().unwrap().error,
            "unsupported_upload"
        );
    }

    #[test]
    fn predict_rejects_undecodable_image() {
        let client = client(ModelState::Ready(Arc::new(random_handle())));
        let resp = post_file(&client, "leaf.png", b"definitely not a png");
        assert_eq!(resp.status(), Status::BadRequest);
        assert_eq!(
            resp.into_json::<ErrorResponse>().unwrap().error,
            "invalid_image"
        );
    }

    #[test]
    fn extension_check_ignores_case() {
        let client = client(ModelState::Ready(Arc::new(random_handle())));
        let resp = post_file(&client, "LEAF.PNG", &leaf_png());
        assert_eq!(resp.status(), Status::Ok);
    }

    #[test]
    fn model_info_reports_unavailable_reason() {
        let client = client(unavailable());
        let info = client
            .get("/model")
            .dispatch()
            .into_json::<ModelInfoResponse>()
            .unwrap();
        assert_eq!(info.status, "unavailable");
        assert_eq!(info.reason.as_deref(), Some("weights missing"));
        assert!(info.num_classes.is_none());
    }

    #[test]
    fn model_info_reports_ready_model() {
        let client = client(ModelState::Ready(Arc::new(random_handle())));
        let info = client
            .get("/model")
            .dispatch()
            .into_json::<ModelInfoResponse>()
            .unwrap();
        assert_eq!(info.status, "ready");
        assert_eq!(info.num_classes, Some(LABEL_COUNT));
        assert_eq!(info.source, "test");
        assert!(info.missing_parameters.is_empty());
    }

    #[test]
    fn labels_lists_full_catalog() {
        let client = client(unavailable());
        let catalog = client
            .get("/labels")
            .dispatch()
            .into_json::<Vec<DiseaseResponse>>()
            .unwrap();
        assert_eq!(catalog.len(), LABEL_COUNT);
        assert_eq!(catalog[0].label, "Apple___Apple_scab");
        assert_eq!(catalog[0].crop.as_deref(), Some("Apple"));
        assert_eq!(catalog[0].healthy, Some(false));
        assert_eq!(catalog.iter().filter(|d| d.healthy == Some(true)).count(), 12);
    }

    #[test]
    fn unknown_disease_gets_fallback() {
        let client = client(unavailable());
        let body = client
            .get("/diseases/Banana___Sigatoka")
            .dispatch()
            .into_json::<DiseaseResponse>()
            .unwrap();
        assert_eq!(body.description, DiseaseInfo::FALLBACK.description);
        assert_eq!(body.remedy, DiseaseInfo::FALLBACK.remedy);
        assert!(body.crop.is_none());
        assert!(body.healthy.is_none());
    }
}
