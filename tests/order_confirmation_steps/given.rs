//! Given steps for order confirmation scenarios.

use confirmation_engine::workflow::{
    domain::{OrderOptions, ServiceZone},
    services::SendOrderConfirmation,
};
use eyre::bail;
use rstest_bdd_macros::given;

use super::world::{OrderConfirmationWorld, run_async, staff};

fn zone(name: &str) -> eyre::Result<ServiceZone> {
    match name {
        "standard" => Ok(ServiceZone::Standard),
        "extended" => Ok(ServiceZone::Extended),
        other => bail!("unknown service zone {other}"),
    }
}

fn send(world: &mut OrderConfirmationWorld, options: OrderOptions) -> eyre::Result<()> {
    let task_id = world.task_id()?;
    let sent = run_async(
        world
            .service
            .send(SendOrderConfirmation { task_id, options }, &staff()),
    )?;
    world.token = Some(sent.record.token().as_str().to_owned());
    world.record = Some(sent.record);
    Ok(())
}

#[given("a task awaiting confirmation")]
fn task_awaiting_confirmation(world: &mut OrderConfirmationWorld) -> eyre::Result<()> {
    world.seed_task()?;
    Ok(())
}

#[given(r#"an order confirmation sent for zone "{name}" with glass risk"#)]
fn sent_with_glass_risk(world: &mut OrderConfirmationWorld, name: String) -> eyre::Result<()> {
    let options = OrderOptions {
        service_zone: zone(&name)?,
        add_glass_risk: true,
        ..OrderOptions::default()
    };
    send(world, options)
}

#[given(r#"an order confirmation sent for zone "{name}" without add-ons"#)]
fn sent_without_add_ons(world: &mut OrderConfirmationWorld, name: String) -> eyre::Result<()> {
    let options = OrderOptions {
        service_zone: zone(&name)?,
        ..OrderOptions::default()
    };
    send(world, options)
}
