//! When steps for order confirmation scenarios.

use chrono::TimeDelta;
use confirmation_engine::workflow::domain::{ItemAnswer, LineItemType, OrderConfirmationResponse};
use eyre::{WrapErr, eyre};
use rstest_bdd_macros::when;

use super::world::{OrderConfirmationWorld, run_async, staff};

/// Parses answers written as `standard=yes, glass_risk=no`.
fn parse_answers(answers: &str) -> eyre::Result<Vec<ItemAnswer>> {
    answers
        .split(',')
        .map(|pair| {
            let (item, verdict) = pair
                .trim()
                .split_once('=')
                .ok_or_else(|| eyre!("answers are written as line=yes|no"))?;
            Ok(ItemAnswer {
                item_type: LineItemType::try_from(item.trim())?,
                accepted: verdict.trim() == "yes",
            })
        })
        .collect()
}

#[when(r#"the customer answers "{answers}""#)]
fn customer_answers(world: &mut OrderConfirmationWorld, answers: String) -> eyre::Result<()> {
    let token = world.token()?;
    let response = OrderConfirmationResponse::new(parse_answers(&answers)?, None)?;
    match run_async(world.service.respond(&token, &response)) {
        Ok(record) => {
            world.record = Some(record);
            world.last_error = None;
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when("staff activate the order")]
fn staff_activate(world: &mut OrderConfirmationWorld) -> eyre::Result<()> {
    let task_id = world.task_id()?;
    let record = run_async(world.service.activate(task_id, &staff()))
        .wrap_err("activate order confirmation")?;
    world.record = Some(record);
    Ok(())
}

#[when("{days:i64} days pass")]
fn days_pass(world: &mut OrderConfirmationWorld, days: i64) -> eyre::Result<()> {
    world.clock.advance(TimeDelta::days(days));
    Ok(())
}
