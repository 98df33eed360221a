use super::*;
use crate::Error;
use crate::dto::*;
use crate::features::*;
use crate::*;
use actix_multipart::Multipart;
use actix_web::HttpResponse;
use actix_web::web;
use anyhow::Context;
use ndarray::Array2;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict))
        .route("/predict_batch", web::post().to(predict_batch))
        .route("/predict_from_csv", web::post().to(predict_from_csv));
}

fn rows(predicted: &Array2<f64>) -> Vec<Vec<f64>> {
    predicted.outer_iter().map(|row| row.to_vec()).collect()
}

/// The service only starts once its bundle has loaded and warmed up.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(PredictorHealth {
        status: String::from("healthy"),
        model_loaded: true,
    })
}

async fn predict(predictor: web::Data<Predictor>, sample: web::Json<BlendSample>) -> Result<HttpResponse, Error> {
    sample.validate()?;
    let predicted = predictor
        .predict(vec![sample.into_inner()])
        .await
        .context("Prediction error")?;
    let predicted_properties = rows(&predicted).into_iter().next().unwrap_or_default();
    Ok(HttpResponse::Ok().json(Prediction { predicted_properties }))
}

async fn predict_batch(predictor: web::Data<Predictor>, batch: web::Json<BatchRequest>) -> Result<HttpResponse, Error> {
    for (i, sample) in batch.blends.iter().enumerate() {
        sample
            .validate()
            .map_err(|e| Error::invalid(format!("blends[{}]: {}", i, e)))?;
    }
    let predicted = predictor
        .predict(batch.into_inner().blends)
        .await
        .context("Batch prediction error")?;
    let predictions = rows(&predicted)
        .into_iter()
        .enumerate()
        .map(|(blend_index, predicted_properties)| BatchPrediction {
            blend_index,
            predicted_properties,
        })
        .collect();
    Ok(HttpResponse::Ok().json(Predictions { predictions }))
}

async fn predict_from_csv(predictor: web::Data<Predictor>, payload: Multipart) -> Result<HttpResponse, Error> {
    let upload = Upload::read(payload).await?;
    let frame = crate::store::Frame::parse(&upload.bytes)?;
    let ids = frame
        .column(PREDICTION_ID_COLUMN)
        .ok_or_else(|| Error::invalid("CSV must contain an 'id' column."))?
        .into_iter()
        .map(RowId::from)
        .collect::<Vec<_>>();
    let features = frame.without(PREDICTION_ID_COLUMN);
    if features.width() != N_FEATURES {
        return Err(Error::invalid(format!(
            "CSV file must contain exactly {} feature columns (excluding 'id'), but found {}.",
            N_FEATURES,
            features.width()
        )));
    }
    let table = features
        .numeric(0..N_FEATURES)
        .and_then(|table| table.rename(feature_columns()))
        .map_err(|e| Error::invalid(format!("{:#}", e)))?;
    let predicted = predictor
        .predict_table(table)
        .await
        .context("Error processing file")?;
    let predictions = ids
        .into_iter()
        .zip(rows(&predicted))
        .map(|(id, predicted_properties)| CsvPrediction {
            id,
            predicted_properties,
        })
        .collect();
    Ok(HttpResponse::Ok().json(Predictions { predictions }))
}
