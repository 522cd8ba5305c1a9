//! Email a backup through SendGrid.
//!

use notifier::{Email, EmailAddress, SendEmailError, SendGrid};

use crate::{
    BackupRequest, CompressedArtifact,
    artifact::file_date,
};

const BODY: &str = "Backup attached.";

/// Sends backups to the configured recipient.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    sendgrid: SendGrid,
    app_name: String,
    to: EmailAddress,
    from: EmailAddress,
}

impl DeliveryClient {
    #[allow(missing_docs)]
    pub fn new(request: &BackupRequest) -> Result<Self, SendEmailError> {
        let delivery = &request.delivery;
        let sendgrid = SendGrid::new(&delivery.api_key, delivery.request_timeout())?
            .with_base_url(&delivery.base_url);

        Ok(Self {
            sendgrid,
            app_name: request.app_name.clone(),
            to: delivery.to.clone(),
            from: delivery.from.clone(),
        })
    }

    /// Build the email for an artifact. The artifact is consumed into the attachment.
    pub fn email(&self, artifact: CompressedArtifact) -> Email {
        let subject = format!(
            "[{}] Database backup {}",
            self.app_name,
            file_date(artifact.created())
        );

        let mut email = Email::new(self.to.clone(), self.from.clone(), subject, BODY);
        email.attach(artifact.into_attachment());

        email
    }

    /// Send an artifact. Succeeds only if SendGrid accepted it.
    pub async fn deliver(&self, artifact: CompressedArtifact) -> Result<(), SendEmailError> {
        let email = self.email(artifact);
        self.sendgrid.send(&email).await
    }
}
