//! Message templates rendered with `minijinja`.

use chrono::NaiveDate;
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

/// Named message templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTemplate {
    /// SMS carrying the order confirmation link.
    OrderConfirmationSms,
    /// Subject line of the order confirmation email.
    OrderConfirmationSubject,
    /// HTML body of the order confirmation email.
    OrderConfirmationEmail,
    /// SMS sent by a staff test delivery.
    OrderConfirmationTestSms,
    /// SMS telling an owner a task was registered at their address.
    BygherreConfirmTaskSms,
    /// SMS proposing one outdoor visit slot.
    BygherreOutdoorSms,
    /// SMS asking an owner to pick an indoor visit slot.
    BygherreIndoorSms,
    /// SMS confirming the final visit slot.
    BygherreFinalSms,
    /// SMS carrying the photo report review link.
    PhotoReportSms,
    /// Subject line of the photo report email.
    PhotoReportSubject,
    /// HTML body of the photo report email.
    PhotoReportEmail,
}

impl MessageTemplate {
    const ALL: [Self; 11] = [
        Self::OrderConfirmationSms,
        Self::OrderConfirmationSubject,
        Self::OrderConfirmationEmail,
        Self::OrderConfirmationTestSms,
        Self::BygherreConfirmTaskSms,
        Self::BygherreOutdoorSms,
        Self::BygherreIndoorSms,
        Self::BygherreFinalSms,
        Self::PhotoReportSms,
        Self::PhotoReportSubject,
        Self::PhotoReportEmail,
    ];

    /// Returns the registered template name.
    ///
    /// HTML templates end in `.html` so `minijinja` auto-escapes them.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OrderConfirmationSms => "order_confirmation_sms.txt",
            Self::OrderConfirmationSubject => "order_confirmation_subject.txt",
            Self::OrderConfirmationEmail => "order_confirmation_email.html",
            Self::OrderConfirmationTestSms => "order_confirmation_test_sms.txt",
            Self::BygherreConfirmTaskSms => "bygherre_confirm_task_sms.txt",
            Self::BygherreOutdoorSms => "bygherre_outdoor_sms.txt",
            Self::BygherreIndoorSms => "bygherre_indoor_sms.txt",
            Self::BygherreFinalSms => "bygherre_final_sms.txt",
            Self::PhotoReportSms => "photo_report_sms.txt",
            Self::PhotoReportSubject => "photo_report_subject.txt",
            Self::PhotoReportEmail => "photo_report_email.html",
        }
    }

    const fn source(self) -> &'static str {
        match self {
            Self::OrderConfirmationSms => {
                "Hej {{ recipient }}. I har modtaget en ordrebekræftelse fra {{ brand }}. \
                 Gennemse og bekræft her: {{ link }}"
            }
            Self::OrderConfirmationSubject => {
                "{% if test %}[TEST] {% endif %}Ordrebekræftelse – {{ address }} | {{ brand }}"
            }
            Self::OrderConfirmationEmail => ORDER_CONFIRMATION_EMAIL,
            Self::OrderConfirmationTestSms => "{{ brand }} test. Åbn ordrebekræftelse: {{ link }}",
            Self::BygherreConfirmTaskSms => {
                "Hej {{ recipient }},\n\nVi har registreret en service-opgave på din adresse: \
                 {{ address }}.\n\nMvh. {{ brand }}"
            }
            Self::BygherreOutdoorSms => BYGHERRE_OUTDOOR_SMS,
            Self::BygherreIndoorSms => BYGHERRE_INDOOR_SMS,
            Self::BygherreFinalSms => BYGHERRE_FINAL_SMS,
            Self::PhotoReportSms => {
                "Hej {{ recipient }}! {{ brand }} har fundet ekstra skader på {{ address }}. \
                 Se og godkend rapporten her: {{ link }}"
            }
            Self::PhotoReportSubject => "{{ brand }}: Fotorapport til godkendelse - {{ address }}",
            Self::PhotoReportEmail => PHOTO_REPORT_EMAIL,
        }
    }
}

const ORDER_CONFIRMATION_EMAIL: &str = r#"<h2>Ordrebekræftelse – {{ address }}</h2>
<p>Hej {{ recipient }},</p>
<p>Vi har modtaget jeres opgave og beder jer gennemse og bekræfte nedenstående.</p>
<p><a href="{{ link }}">SE OG BEKRÆFT ORDREBEKRÆFTELSE</a></p>
<p>Eller åbn dette link i din browser: {{ link }}</p>
{% if expires_at %}<p>Linket er aktivt til {{ expires_at | danish_date }}.</p>{% endif %}
<p>Mvh.<br/>{% if sender %}<strong>{{ sender }}</strong><br/>{% endif %}{{ brand }}</p>"#;

const BYGHERRE_OUTDOOR_SMS: &str = "Hej {{ recipient }},\n\nVi kommer forbi {{ address }} den \
{% if dates %}{{ dates[0].date | danish_date }}{% if dates[0].timeSlot %} kl. \
{{ dates[0].timeSlot | time_slot }}{% endif %}{% else %}snart{% endif %} for udvendigt arbejde.\
\n\nBekræft venligst her: {{ link }}\n\nMvh. {{ brand }}";

const BYGHERRE_INDOOR_SMS: &str = "Hej {{ recipient }},\n\nVi skal udføre indvendigt arbejde på \
{{ address }}.\n\nVælg venligst en af følgende datoer:\n{% for slot in dates %}\
{{ slot.date | danish_date }} kl. {{ slot.timeSlot | time_slot }}{% if not loop.last %}\n{% endif %}\
{% endfor %}\n\nBekræft her: {{ link }}\n\nMvh. {{ brand }}";

const BYGHERRE_FINAL_SMS: &str = "Hej {{ recipient }},\n\nDin aftale er nu bekræftet!\n\n\
Dato: {{ date | danish_date }}\nTidspunkt: {{ time_slot | time_slot }}\nAdresse: {{ address }}\
\n\nMvh. {{ brand }}";

const PHOTO_REPORT_EMAIL: &str = r#"<h2>Fotorapport til godkendelse</h2>
<p>Hej {{ recipient }},</p>
<p>Vi har fundet {{ damage_count }} skade{% if damage_count != 1 %}r{% endif %} på {{ address }}, som kræver jeres godkendelse.</p>
<p><a href="{{ link }}">SE OG GODKEND RAPPORTEN</a></p>
<p>Mvh.<br/>{{ brand }}</p>"#;

/// Errors raised while rendering a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render template {template}: {reason}")]
pub struct TemplateError {
    /// Template name.
    pub template: &'static str,
    /// Renderer message.
    pub reason: String,
}

/// Registered message templates sharing one `minijinja` environment.
#[derive(Debug)]
pub struct MessageTemplates {
    environment: Environment<'static>,
}

impl MessageTemplates {
    /// Registers every template and the `brand` global.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when a built-in template fails to parse.
    pub fn new(brand_name: &str) -> Result<Self, TemplateError> {
        let mut environment = Environment::new();
        environment.add_filter("danish_date", danish_date);
        environment.add_filter("time_slot", format_time_slot);
        environment.add_global("brand", brand_name.to_owned());
        for template in MessageTemplate::ALL {
            environment
                .add_template(template.name(), template.source())
                .map_err(|err| TemplateError {
                    template: template.name(),
                    reason: err.to_string(),
                })?;
        }
        Ok(Self { environment })
    }

    /// Renders a template with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when rendering fails.
    pub fn render<S: Serialize>(
        &self,
        template: MessageTemplate,
        context: &S,
    ) -> Result<String, TemplateError> {
        let to_error = |err: minijinja::Error| TemplateError {
            template: template.name(),
            reason: err.to_string(),
        };
        self.environment
            .get_template(template.name())
            .map_err(to_error)?
            .render(context)
            .map_err(to_error)
    }
}

/// Formats an ISO date (`2026-03-10`) as `10.03.2026`.
///
/// Values that are not ISO dates pass through unchanged.
fn danish_date(value: &str) -> String {
    let date_part = value.split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_or_else(|_| value.to_owned(), |date| date.format("%d.%m.%Y").to_string())
}

/// Expands a time slot code such as `08-10` into `08:00-10:00`.
///
/// Unknown codes pass through unchanged.
fn format_time_slot(slot: &str) -> String {
    match slot {
        "08-10" => "08:00-10:00".to_owned(),
        "10-12" => "10:00-12:00".to_owned(),
        "12-14" => "12:00-14:00".to_owned(),
        "08-14" => "08:00-14:00".to_owned(),
        other => other.to_owned(),
    }
}
