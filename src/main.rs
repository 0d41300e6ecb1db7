use std::fmt::{Debug, Display};

use factory_link::core::{get_subscriber, init_subscriber, AppConfig};
use factory_link::factory_link_web_server::FactoryLinkWebServer;
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let file_appender = tracing_appender::rolling::daily("/var/tmp/log/factory_link", "app");

    let subscriber = get_subscriber("factory_link".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new().expect("cant build our appConfig object");

    let factory_link_web_server = FactoryLinkWebServer::build(config.clone())
        .await
        .expect("application could run for some obvious reasons");

    let _x = tokio::spawn(factory_link_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "{}",
        format!(
            "🚀 Server started on Addr: {}:{}",
            config.factory_link_server_config.host, config.factory_link_server_config.port
        )
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        o = _x => {report_exit("factory_link_web_server", o);}
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
