use leaf_diagnosis::{server, telemetry};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let _rocket = server::rocket().launch().await?;
    Ok(())
}
