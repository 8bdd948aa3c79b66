use tracing::info;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Out-of-band delivery for confirmation codes.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of delivering it.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: Mail) -> anyhow::Result<()> {
        info!(from = %mail.from, to = %mail.to, subject = %mail.subject, body = %mail.body, "outgoing mail");
        Ok(())
    }
}

pub fn confirmation_mail(from: &str, to: &str, code: &str) -> Mail {
    Mail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "YaMDB confirmation code".to_string(),
        body: format!("Your confirmation code: {code}"),
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::{Mail, Mailer};

    #[derive(Default)]
    pub struct MemoryMailer {
        sent: Mutex<Vec<Mail>>,
    }

    impl MemoryMailer {
        pub fn last_code_for(&self, to: &str) -> Option<String> {
            let sent = self.sent.lock().expect("mailer lock");
            sent.iter()
                .rev()
                .find(|m| m.to == to)
                .and_then(|m| m.body.rsplit(' ').next())
                .map(str::to_string)
        }
    }

    impl Mailer for MemoryMailer {
        fn send(&self, mail: Mail) -> anyhow::Result<()> {
            self.sent.lock().expect("mailer lock").push(mail);
            Ok(())
        }
    }
}
