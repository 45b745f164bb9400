use crate::config::SmtpConfig;
use crate::error::{MailmanError, Result};
use crate::merge_template::RenderedEmail;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MessageBuilder};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};

pub struct Mailer {
    smtp: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let tls_parameters = TlsParameters::new(config.host.clone())?;

        let smtp = SmtpTransport::relay(&config.host)?
            .credentials(creds)
            .port(config.port)
            .tls(Tls::Wrapper(tls_parameters))
            .build();

        Ok(Mailer {
            smtp,
            from: config.from.parse()?,
        })
    }

    pub fn send(&self, email: &RenderedEmail) -> Result<()> {
        let message = build_message(&self.from, email)?;
        self.smtp.send(&message)?;
        log::info!("sent row {} to {}", email.row, email.to);
        Ok(())
    }
}

/// Split a comma or semicolon separated address list, skipping blanks.
fn mailboxes(list: &str) -> Result<Vec<Mailbox>> {
    list.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Mailbox>().map_err(MailmanError::from))
        .collect()
}

/// Build an HTML message for a rendered email.
pub fn build_message(from: &Mailbox, email: &RenderedEmail) -> Result<Message> {
    let mut builder: MessageBuilder = Message::builder()
        .from(from.clone())
        .subject(email.subject.clone());
    for mailbox in mailboxes(&email.to)? {
        builder = builder.to(mailbox);
    }
    for mailbox in mailboxes(&email.cc)? {
        builder = builder.cc(mailbox);
    }
    for mailbox in mailboxes(&email.bcc)? {
        builder = builder.bcc(mailbox);
    }

    Ok(builder
        .header(ContentType::TEXT_HTML)
        .body(email.body.clone())?)
}
