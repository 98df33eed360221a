use super::*;
use crate::config::PredictorArgs;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;

pub struct Server;

impl Server {
    pub async fn run(args: PredictorArgs) -> anyhow::Result<()> {
        let predictor = web::Data::new(Predictor::load(&args.model, args.device, args.workers).await?);
        let state = predictor.clone();
        log::info!("starting prediction server on {}", args.bind);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .app_data(state.clone())
                .configure(crate::error::rejections)
                .configure(handlers::routes)
        })
        .bind(&args.bind)?
        .run()
        .await?;
        predictor.shutdown();
        Ok(())
    }
}
