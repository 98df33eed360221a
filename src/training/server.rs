use super::*;
use crate::config::TrainerArgs;
use crate::registry::Registry;
use crate::store::Store;
use crate::workers::Pool;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;

pub struct Server;

impl Server {
    pub async fn run(args: TrainerArgs) -> anyhow::Result<()> {
        let store = Store::open(&args.root)?;
        let pool = Pool::new("training", args.workers)?;
        let trainer = web::Data::new(Trainer::new(Arc::new(Registry::default()), store, pool));
        let state = trainer.clone();
        log::info!("starting training server on {}", args.bind);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(state.clone())
                .configure(crate::error::rejections)
                .configure(handlers::routes)
        })
        .bind(&args.bind)?
        .run()
        .await?;
        log::info!("http server stopped, waiting for training jobs");
        trainer.shutdown();
        Ok(())
    }
}
