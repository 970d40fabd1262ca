// Notification of finished runs - email via lettre

use crate::config::EmailConfig;
use crate::pipeline::RunSummary;
use anyhow::{anyhow, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

/// Receives the finished report. Never part of the discovery pipeline itself.
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &RunSummary) -> Result<()>;

    fn name(&self) -> &str;
}

/// Most domains listed inline in the message body; the attachment always has all of them
const INLINE_DOMAIN_LIMIT: usize = 50;

pub struct EmailNotifier {
    config: EmailConfig,
    password: String,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig, password: String) -> Self {
        Self { config, password }
    }

    /// Take the SMTP password from the environment variable named in the settings.
    pub fn from_env(config: EmailConfig) -> Result<Self> {
        let password = std::env::var(&config.password_env).with_context(|| {
            format!(
                "SMTP password environment variable {} is not set",
                config.password_env
            )
        })?;
        Ok(Self::new(config, password))
    }

    fn subject(&self, summary: &RunSummary) -> String {
        if summary.has_new_domains() {
            format!(
                "{} {} new possible typosquatting domain(s) detected",
                self.config.subject_prefix,
                summary.new_count()
            )
        } else {
            format!("{} No new typosquatting domains", self.config.subject_prefix)
        }
    }

    fn text_body(&self, summary: &RunSummary) -> String {
        let date = chrono::Local::now().format("%Y-%m-%d %H:%M");

        if !summary.has_new_domains() {
            return format!(
                "typosentry run at {}\n\n\
                No new results. {} monitored domain(s) checked, every candidate was already known.\n",
                date, summary.monitored
            );
        }

        let mut body = format!(
            "typosentry run at {}\n\n\
            {} new domain(s) need review. Block confirmed squatters and add every reviewed \
            domain to the known-domain list.\n\n",
            date,
            summary.new_count()
        );
        for domain in summary.new_domains.iter().take(INLINE_DOMAIN_LIMIT) {
            body.push_str(&format!("  {}\n", domain));
        }
        if summary.new_count() > INLINE_DOMAIN_LIMIT {
            body.push_str(&format!(
                "  ... and {} more (see attachment)\n",
                summary.new_count() - INLINE_DOMAIN_LIMIT
            ));
        }
        body
    }

    pub(crate) fn build_message(&self, summary: &RunSummary) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.config.from_address.parse::<Mailbox>()?)
            .subject(self.subject(summary));

        for to_addr in &self.config.to_addresses {
            builder = builder.to(to_addr.parse::<Mailbox>()?);
        }

        let text = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(self.text_body(summary));

        if !summary.has_new_domains() {
            return Ok(builder.singlepart(text)?);
        }

        let report = std::fs::read(&summary.report_path).with_context(|| {
            format!("Failed to read report {}", summary.report_path.display())
        })?;
        let filename = summary
            .report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results.csv".to_string());
        let csv_type = ContentType::parse("text/csv")
            .map_err(|e| anyhow!("invalid attachment content type: {}", e))?;

        let message = builder.multipart(
            MultiPart::mixed()
                .singlepart(text)
                .singlepart(Attachment::new(filename).body(report, csv_type)),
        )?;
        Ok(message)
    }

    /// Authenticated submission, upgrading to TLS when the server offers STARTTLS.
    fn transport(&self) -> Result<SmtpTransport> {
        let tls = TlsParameters::new(self.config.smtp_server.clone())?;
        let transport = SmtpTransport::builder_dangerous(&self.config.smtp_server)
            .port(self.config.smtp_port)
            .tls(Tls::Opportunistic(tls))
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.password.clone(),
            ))
            .build();
        Ok(transport)
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, summary: &RunSummary) -> Result<()> {
        let message = self.build_message(summary)?;
        self.transport()?
            .send(&message)
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;
        info!(
            "Sent notification to {} recipient(s)",
            self.config.to_addresses.len()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::InvocationStats;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_config() -> EmailConfig {
        EmailConfig {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            from_address: "typosentry@example.com".to_string(),
            to_addresses: vec!["soc@example.com".to_string()],
            username: "typosentry@example.com".to_string(),
            password_env: "TYPOSENTRY_TEST_UNSET_PASSWORD".to_string(),
            subject_prefix: "[typosentry]".to_string(),
        }
    }

    fn summary(report_path: PathBuf, new_domains: &[&str]) -> RunSummary {
        RunSummary {
            report_path,
            new_domains: new_domains.iter().map(|s| s.to_string()).collect(),
            monitored: 1,
            invocations: InvocationStats::default(),
            artifacts_parsed: 1,
            parse_failures: 0,
            candidates: new_domains.len(),
            cleanup_removed: 0,
            cleanup_failures: 0,
        }
    }

    #[test]
    fn test_from_env_requires_password() {
        assert!(EmailNotifier::from_env(create_test_config()).is_err());
    }

    #[test]
    fn test_no_new_results_message() {
        let notifier = EmailNotifier::new(create_test_config(), "pass".to_string());
        let s = summary(PathBuf::from("/nonexistent/results.csv"), &[]);

        assert_eq!(notifier.subject(&s), "[typosentry] No new typosquatting domains");
        assert!(notifier.text_body(&s).contains("No new results"));

        // no attachment, so the missing report file is never read
        let message = notifier.build_message(&s).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("soc@example.com"));
        assert!(!raw.contains("results.csv"));
    }

    #[test]
    fn test_alert_message_attaches_report() {
        let tmp = TempDir::new().unwrap();
        let report = tmp.path().join("results.csv");
        std::fs::write(&report, "Domain\nexarnple.com\n").unwrap();

        let notifier = EmailNotifier::new(create_test_config(), "pass".to_string());
        let s = summary(report, &["exarnple.com"]);

        assert!(notifier.subject(&s).contains("1 new"));
        let message = notifier.build_message(&s).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("text/csv"));
        assert!(raw.contains("results.csv"));
    }

    #[test]
    fn test_body_truncates_long_lists() {
        let notifier = EmailNotifier::new(create_test_config(), "pass".to_string());
        let many: Vec<String> = (0..60).map(|i| format!("d{}.com", i)).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let body = notifier.text_body(&summary(PathBuf::from("r.csv"), &refs));
        assert!(body.contains("d49.com"));
        assert!(!body.contains("d50.com"));
        assert!(body.contains("and 10 more"));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut config = create_test_config();
        config.to_addresses = vec!["not an address".to_string()];
        let notifier = EmailNotifier::new(config, "pass".to_string());
        assert!(notifier.build_message(&summary(PathBuf::from("r.csv"), &[])).is_err());
    }
}
