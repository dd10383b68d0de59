//! Then steps for order confirmation scenarios.

use confirmation_engine::workflow::{
    domain::{Acceptance, LineItemType, WorkflowState},
    services::WorkflowServiceError,
};
use eyre::{bail, ensure, eyre};
use rstest_bdd_macros::then;

use super::world::{OrderConfirmationWorld, run_async};

#[then(r#"the offered lines are "{lines}""#)]
fn offered_lines(world: &OrderConfirmationWorld, lines: String) -> eyre::Result<()> {
    let record = world.record.as_ref().ok_or_else(|| eyre!("nothing was sent"))?;
    let offered: Vec<&str> = record
        .items()
        .iter()
        .map(|item| item.item_type.as_str())
        .collect();
    let expected: Vec<&str> = lines.split(',').map(str::trim).collect();
    ensure!(offered == expected, "offered {offered:?}, expected {expected:?}");
    Ok(())
}

#[then(r#"the confirmation status is "{status}""#)]
fn confirmation_status(world: &OrderConfirmationWorld, status: String) -> eyre::Result<()> {
    let task_id = world.task_id()?;
    let stored = run_async(world.service.find_for_task(task_id))?
        .ok_or_else(|| eyre!("no confirmation stored for the task"))?;
    let actual = stored.status().as_str();
    ensure!(actual == status, "status is {actual}, expected {status}");
    Ok(())
}

#[then(r#"the task has left "{status}""#)]
fn task_left_status(world: &OrderConfirmationWorld, status: String) -> eyre::Result<()> {
    let task = world.task()?;
    ensure!(task.status().as_str() != status, "task is still {status}");
    Ok(())
}

#[then(r#"the task mirrors order confirmation status "{status}""#)]
fn task_mirrors_status(world: &OrderConfirmationWorld, status: String) -> eyre::Result<()> {
    let task = world.task()?;
    let mirrored = task.mirror().order_confirmation_status.as_deref();
    ensure!(
        mirrored == Some(status.as_str()),
        "task mirrors {mirrored:?}, expected {status}"
    );
    Ok(())
}

#[then("the answer is refused as already responded")]
fn answer_refused(world: &OrderConfirmationWorld) -> eyre::Result<()> {
    match &world.last_error {
        Some(WorkflowServiceError::AlreadyResponded) => Ok(()),
        Some(other) => bail!("unexpected error: {other}"),
        None => bail!("the second answer was accepted"),
    }
}

#[then(r#"line "{line}" stays accepted"#)]
fn line_stays_accepted(world: &OrderConfirmationWorld, line: String) -> eyre::Result<()> {
    let wanted = LineItemType::try_from(line.as_str())?;
    let token = world.token()?;
    let stored = run_async(world.service.public_fetch(&token))?;
    let verdict = stored
        .items()
        .iter()
        .find(|item| item.item_type == wanted)
        .map(|item| item.accepted);
    ensure!(
        verdict == Some(Acceptance::Accepted),
        "line {line} is {verdict:?}"
    );
    Ok(())
}

#[then("opening the link reports that it has expired")]
fn link_expired(world: &OrderConfirmationWorld) -> eyre::Result<()> {
    let token = world.token()?;
    match run_async(world.service.public_fetch(&token)) {
        Err(WorkflowServiceError::Expired) => Ok(()),
        Err(other) => bail!("unexpected error: {other}"),
        Ok(record) => bail!("link still open with status {:?}", record.status()),
    }
}
