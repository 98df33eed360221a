use super::*;
use crate::Error;
use crate::dto::*;
use crate::model::Device;
use crate::registry::Status;
use actix_multipart::Multipart;
use actix_web::HttpResponse;
use actix_web::http::header::ContentDisposition;
use actix_web::http::header::DispositionParam;
use actix_web::http::header::DispositionType;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .route("/upload_dataset", web::post().to(upload_dataset))
        .route("/start_training", web::post().to(start_training))
        .route("/training_status/{job_id}", web::get().to(training_status))
        .route("/training_jobs", web::get().to(training_jobs))
        .route("/cancel_training/{job_id}", web::post().to(cancel_training))
        .route("/models", web::get().to(models))
        .route("/datasets", web::get().to(datasets))
        .route("/download_model/{name}", web::get().to(download_model))
        .route("/models/{name}", web::delete().to(delete_models));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(Message {
        message: String::from("Training API is running."),
    })
}

async fn health(trainer: web::Data<Trainer>) -> HttpResponse {
    HttpResponse::Ok().json(TrainerHealth {
        status: String::from("healthy"),
        device: Device::best(),
        cuda_available: Device::cuda_available(),
        active_training_jobs: trainer.registry().running(),
    })
}

async fn upload_dataset(trainer: web::Data<Trainer>, payload: Multipart) -> Result<HttpResponse, Error> {
    let upload = Upload::read(payload).await?;
    if !upload.filename.as_deref().is_some_and(|name| name.ends_with(".csv")) {
        return Err(Error::invalid("Only CSV files are supported"));
    }
    let trainer = trainer.into_inner();
    let (filename, frame) = web::block(move || trainer.store().save_dataset(&upload.bytes))
        .await
        .map_err(|e| anyhow::anyhow!("upload worker failed: {}", e))??;
    Ok(HttpResponse::Ok().json(Uploaded::new(filename, &frame)))
}

async fn start_training(
    trainer: web::Data<Trainer>,
    query: web::Query<StartTraining>,
    config: web::Json<TrainingConfig>,
) -> Result<HttpResponse, Error> {
    let job_id = trainer.start(&query.dataset_filename, config.into_inner())?;
    Ok(HttpResponse::Ok().json(Started {
        message: String::from("Training started"),
        job_id,
        status: Status::Pending,
    }))
}

async fn training_status(trainer: web::Data<Trainer>, path: web::Path<String>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(trainer.registry().get(&path.into_inner())?))
}

async fn training_jobs(trainer: web::Data<Trainer>) -> HttpResponse {
    HttpResponse::Ok().json(Jobs {
        jobs: trainer.registry().list(),
    })
}

async fn cancel_training(trainer: web::Data<Trainer>, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let job_id = path.into_inner();
    trainer.registry().cancel(&job_id)?;
    Ok(HttpResponse::Ok().json(Cancelled {
        message: String::from("Cancellation requested"),
        job_id,
    }))
}

async fn models(trainer: web::Data<Trainer>) -> Result<HttpResponse, Error> {
    let trainer = trainer.into_inner();
    let models = web::block(move || trainer.store().list_models())
        .await
        .map_err(|e| anyhow::anyhow!("listing worker failed: {}", e))??;
    Ok(HttpResponse::Ok().json(Models { models }))
}

async fn datasets(trainer: web::Data<Trainer>) -> Result<HttpResponse, Error> {
    let trainer = trainer.into_inner();
    let datasets = web::block(move || trainer.store().list_datasets())
        .await
        .map_err(|e| anyhow::anyhow!("listing worker failed: {}", e))??;
    Ok(HttpResponse::Ok().json(Datasets { datasets }))
}

async fn download_model(trainer: web::Data<Trainer>, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let trainer = trainer.into_inner();
    let name = path.into_inner();
    let (filename, bytes) = web::block(move || trainer.store().download_model(&name))
        .await
        .map_err(|e| anyhow::anyhow!("download worker failed: {}", e))??;
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(bytes))
}

async fn delete_models(trainer: web::Data<Trainer>, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let trainer = trainer.into_inner();
    let prefix = path.into_inner();
    let files = web::block(move || trainer.store().delete_models(&prefix))
        .await
        .map_err(|e| anyhow::anyhow!("deletion worker failed: {}", e))??;
    Ok(HttpResponse::Ok().json(Deleted::from(files)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::registry::TrainingJob;
    use crate::store::Store;
    use crate::workers::Pool;
    use actix_web::App;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::sync::Arc;
    use std::time::Duration;

    const BOUNDARY: &str = "----blendprop-test";

    fn multipart(filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n",
            b = BOUNDARY,
            f = filename
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        (format!("multipart/form-data; boundary={}", BOUNDARY), body)
    }

    fn csv(columns: usize) -> Vec<u8> {
        let header = (0..columns).map(|c| format!("c{}", c)).collect::<Vec<_>>().join(",");
        let row = (0..columns).map(|c| c.to_string()).collect::<Vec<_>>().join(",");
        format!("{}\n{}\n", header, row).into_bytes()
    }

    fn state(dir: &std::path::Path) -> web::Data<Trainer> {
        web::Data::new(Trainer::new(
            Arc::new(Registry::default()),
            Store::open(dir).unwrap(),
            Pool::new("training", 2).unwrap(),
        ))
    }

    macro_rules! service {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(crate::error::rejections)
                    .configure(routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_device_and_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let app = service!(state);
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["device"], "cpu");
        assert_eq!(body["cuda_available"], false);
        assert_eq!(body["active_training_jobs"], 0);
    }

    #[actix_web::test]
    async fn upload_enforces_column_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let app = service!(state);

        let (content_type, body) = multipart("narrow.csv", &csv(59));
        let req = test::TestRequest::post()
            .uri("/upload_dataset")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let (content_type, body) = multipart("wide.csv", &csv(60));
        let req = test::TestRequest::post()
            .uri("/upload_dataset")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let uploaded: Uploaded = test::call_and_read_body_json(&app, req).await;
        assert_eq!(uploaded.shape, (1, 60));
        assert_eq!(uploaded.columns.len(), 11);

        let listed: Datasets =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/datasets").to_request()).await;
        assert_eq!(listed.datasets.len(), 1);
        assert_eq!(listed.datasets[0].filename, uploaded.filename);
    }

    #[actix_web::test]
    async fn upload_requires_csv_extension() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let app = service!(state);
        let (content_type, body) = multipart("data.txt", &csv(60));
        let req = test::TestRequest::post()
            .uri("/upload_dataset")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Only CSV files are supported");
    }

    #[actix_web::test]
    async fn start_training_validates_and_queues() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let app = service!(state);

        let req = test::TestRequest::post()
            .uri("/start_training?dataset_filename=missing.csv")
            .set_json(serde_json::json!({ "model_name": "m" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let (filename, _) = state.store().save_dataset(&sample_dataset(30)).unwrap();
        let req = test::TestRequest::post()
            .uri(&format!("/start_training?dataset_filename={}", filename))
            .set_json(serde_json::json!({ "model_name": "m", "validation_split": 0.9 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/start_training?dataset_filename={}", filename))
            .set_json(serde_json::json!({ "model_name": "m", "target_transformation": "log" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].is_string());

        let req = test::TestRequest::post()
            .uri(&format!("/start_training?dataset_filename={}", filename))
            .set_json(serde_json::json!({ "model_name": "m", "save_model": false }))
            .to_request();
        let started: Started = test::call_and_read_body_json(&app, req).await;
        assert_eq!(started.status, Status::Pending);

        let uri = format!("/training_status/{}", started.job_id);
        let mut job: TrainingJob = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        for _ in 0..3000 {
            if job.is_terminal() {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(20)).await;
            job = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        }
        assert_eq!(job.status, Status::Completed, "{}", job.message);

        let jobs: Jobs =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/training_jobs").to_request()).await;
        assert_eq!(jobs.jobs.len(), 1);

        let req = test::TestRequest::post().uri(&format!("/cancel_training/{}", started.job_id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn unknown_jobs_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let app = service!(state);
        let req = test::TestRequest::get().uri("/training_status/train_0_0").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Training job not found");
    }

    #[actix_web::test]
    async fn models_download_and_delete_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let app = service!(state);

        let req = test::TestRequest::delete().uri("/models/absent").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let bundle = crate::model::Bundle::fixture(crate::model::Transformation::None, false);
        state.store().save_model(&bundle, "blend").unwrap();
        state.store().save_model(&bundle, "blend").unwrap();

        let listed: Models =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/models").to_request()).await;
        assert_eq!(listed.models.len(), 2);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/download_model/blend").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), "application/octet-stream");
        assert!(resp.headers().get("content-disposition").unwrap().to_str().unwrap().contains("attachment"));

        let req = test::TestRequest::delete().uri("/models/blend").to_request();
        let deleted: Deleted = test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted.count, 2);
        assert_eq!(deleted.files.len(), 2);
    }
}
