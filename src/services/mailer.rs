use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Payload of an approval notice; unrelated to the validation pipeline's
/// control flow, it only shares the API process.
#[derive(Debug, Clone)]
pub struct ApprovalNotice {
    pub email: String,
    pub name: String,
    pub roll_number: String,
    pub password: String,
    pub login_url: String,
}

/// SMTP sender for registration-approval notices.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(
        host: &str,
        port: u16,
        user: &str,
        pass: &str,
        from: &str,
    ) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(MailerError::Smtp)?
            .port(port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build();
        let from = from.parse::<Mailbox>().map_err(MailerError::Address)?;
        Ok(Self { transport, from })
    }

    pub async fn send_approval(&self, notice: &ApprovalNotice) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(notice.email.parse().map_err(MailerError::Address)?)
            .subject("Registration Approved - Login Credentials")
            .header(ContentType::TEXT_HTML)
            .body(approval_body(notice))
            .map_err(MailerError::Message)?;

        self.transport
            .send(message)
            .await
            .map_err(MailerError::Smtp)?;
        Ok(())
    }
}

fn approval_body(notice: &ApprovalNotice) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 10px;">
    <h2 style="color: #1e3a8a; text-align: center;">Registration Approved!</h2>
    <p>Dear <strong>{name}</strong>,</p>
    <p>Congratulations! Your registration for the <strong>Code &amp; Quest Feria 2025</strong> has been verified and approved.</p>
    <p>You can now log in to the candidate portal using the credentials below:</p>
    <div style="background-color: #f3f4f6; padding: 15px; border-radius: 8px; margin: 20px 0;">
        <p style="margin: 5px 0;"><strong>User Name (Roll No):</strong> <span style="font-family: monospace;">{roll_number}</span></p>
        <p style="margin: 5px 0;"><strong>Password:</strong> <span style="font-family: monospace; color: #d97706;">{password}</span></p>
    </div>
    <div style="text-align: center; margin-top: 30px;">
        <a href="{login_url}" style="background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; font-weight: bold;">Login Now</a>
    </div>
    <p style="margin-top: 30px; font-size: 12px; color: #6b7280; text-align: center;">
        If you did not register for this event, please ignore this email.
    </p>
</div>"#,
        name = notice.name,
        roll_number = notice.roll_number,
        password = notice.password,
        login_url = notice.login_url,
    )
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_interpolates_credentials_and_link() {
        let notice = ApprovalNotice {
            email: "jane@example.com".to_string(),
            name: "Jane Doe".to_string(),
            roll_number: "CQ-1042".to_string(),
            password: "s3cret".to_string(),
            login_url: "https://portal.example.com/login".to_string(),
        };
        let body = approval_body(&notice);
        assert!(body.contains("Jane Doe"));
        assert!(body.contains("CQ-1042"));
        assert!(body.contains("s3cret"));
        assert!(body.contains("https://portal.example.com/login"));
    }
}
