//! Photo report review through the public service API.

use confirmation_engine::activity::domain::{ActivityAction, EntityType};
use confirmation_engine::workflow::{
    domain::{
        DamageDecision, DamageDraft, DamageStatus, DamageVerdict, PhotoReportStatus, PhotoReview,
        ReportContact,
    },
    services::{CreatePhotoReport, WorkflowServiceError},
};
use eyre::ensure;
use rstest::rstest;

use super::helpers::{BASE_URL, Portal, portal, staff};

fn damage(id: &str, item: &str) -> DamageDraft {
    DamageDraft {
        id: Some(id.to_owned()),
        item: Some(item.to_owned()),
        damage_type: Some("ridse".to_owned()),
        ..DamageDraft::default()
    }
}

fn verdicts(decisions: &[(&str, DamageVerdict)]) -> eyre::Result<PhotoReview> {
    let decisions = decisions
        .iter()
        .map(|(id, verdict)| DamageDecision {
            id: (*id).to_owned(),
            verdict: *verdict,
            note: None,
        })
        .collect();
    Ok(PhotoReview::new(decisions, None, Some("  ".to_owned()))?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn standalone_report_is_reviewed_and_reset(portal: Portal) -> eyre::Result<()> {
    let service = &portal.photo_reports;
    let draft = service
        .create_draft(
            CreatePhotoReport {
                task_id: None,
                contact: ReportContact {
                    contact_name: Some("Jens Munk".to_owned()),
                    contact_email: Some("jens@example.com".to_owned()),
                    ..ReportContact::default()
                },
                notes: Some("Skader fundet ved besigtigelse".to_owned()),
                damages: vec![damage("a", "Karm"), damage("b", "Rude")],
            },
            &staff(),
        )
        .await?;
    ensure!(draft.status() == PhotoReportStatus::Draft);
    ensure!(portal.email.sent().is_empty());

    let sent = service.send(draft.id(), &staff()).await?;
    let old_token = sent.record.token().as_str().to_owned();
    ensure!(sent.public_url == format!("{BASE_URL}/fotorapport/{old_token}"));
    ensure!(sent.delivery.email_sent());
    ensure!(!sent.delivery.sms_sent());

    let receipt = service
        .submit_review(
            &old_token,
            verdicts(&[("a", DamageVerdict::Approved), ("b", DamageVerdict::Rejected)])?,
        )
        .await?;
    ensure!(receipt.tally.approved_count == 1);
    ensure!(receipt.tally.total_count == 2);
    let reviewed = service.get(draft.id()).await?;
    ensure!(reviewed.details().reviewer_name.as_deref() == Some("Customer"));

    let reset = service.reset(draft.id(), &staff()).await?;
    let new_token = reset.token().as_str().to_owned();
    ensure!(new_token != old_token);
    ensure!(matches!(
        service.public_fetch(&old_token).await,
        Err(WorkflowServiceError::NotFound(_))
    ));
    let fresh = service.public_fetch(&new_token).await?;
    ensure!(fresh.report.status() == PhotoReportStatus::Draft);
    ensure!(
        fresh
            .report
            .items()
            .iter()
            .all(|entry| entry.status == DamageStatus::Pending)
    );
    ensure!(fresh.task.is_none());

    let entries = portal.activity.entries()?;
    ensure!(
        entries
            .iter()
            .all(|entry| entry.entity_type == EntityType::PhotoReport)
    );
    ensure!(
        entries
            .iter()
            .any(|entry| entry.action == ActivityAction::PhotoReportReset)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_reports_are_one_at_a_time(portal: Portal) -> eyre::Result<()> {
    let task_id = portal.seed_task()?;
    let service = &portal.photo_reports;
    let request = CreatePhotoReport {
        task_id: Some(task_id),
        damages: vec![damage("a", "Dør")],
        ..CreatePhotoReport::default()
    };
    let first = service.create_draft(request.clone(), &staff()).await?;
    ensure!(first.snapshot().contact_email.as_deref() == Some("birgitte@example.com"));

    let second = service.create_draft(request, &staff()).await;
    ensure!(matches!(second, Err(WorkflowServiceError::AlreadyOpen { .. })));
    ensure!(service.list_for_task(task_id).await?.len() == 1);
    Ok(())
}
