// studyroom-backend/src/utils/email.rs

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::env;
use thiserror::Error;
use tracing::info;

/// メール送信エラー
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to send email: {0}")]
    SendError(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Missing email configuration")]
    MissingConfiguration,
}

/// メール設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP サーバーホスト
    pub smtp_host: String,
    /// SMTP サーバーポート
    pub smtp_port: u16,
    /// SMTP ユーザー名
    pub smtp_username: String,
    /// SMTP パスワード
    pub smtp_password: String,
    /// 送信者メールアドレス
    pub from_email: String,
    /// 送信者名
    pub from_name: String,
    /// 開発モードかどうか（ログ出力のみ）
    pub development_mode: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: "user".to_string(),
            smtp_password: "password".to_string(),
            from_email: "noreply@example.com".to_string(),
            from_name: "StudyRoom".to_string(),
            development_mode: true, // 開発環境ではデフォルトで true
        }
    }
}

impl EmailConfig {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Result<Self, EmailError> {
        let development_mode = env::var("EMAIL_DEVELOPMENT_MODE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        // 開発モードの場合はデフォルト設定を返す
        if development_mode {
            return Ok(Self {
                development_mode: true,
                ..Default::default()
            });
        }

        // 本番環境の設定
        let smtp_host = env::var("SMTP_HOST").map_err(|_| EmailError::MissingConfiguration)?;

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|_| EmailError::ConfigurationError("Invalid SMTP port".to_string()))?;

        let smtp_username =
            env::var("SMTP_USERNAME").map_err(|_| EmailError::MissingConfiguration)?;

        let smtp_password =
            env::var("SMTP_PASSWORD").map_err(|_| EmailError::MissingConfiguration)?;

        let from_email = env::var("FROM_EMAIL").map_err(|_| EmailError::MissingConfiguration)?;

        let from_name = env::var("FROM_NAME").unwrap_or_else(|_| "StudyRoom".to_string());

        Ok(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_email,
            from_name,
            development_mode: false,
        })
    }
}

/// メール送信サービス
///
/// 送信失敗は呼び出し側でログに残して握りつぶすこと。共有作成やパスワード
/// リセットのレスポンスをメール配送の成否で失敗させてはならない。
pub struct EmailService {
    config: EmailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    frontend_url: String,
}

impl EmailService {
    pub fn new(config: EmailConfig, frontend_url: String) -> Result<Self, EmailError> {
        let transport = if config.development_mode {
            None
        } else {
            let credentials =
                Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| EmailError::ConfigurationError(e.to_string()))?
                .port(config.smtp_port)
                .credentials(credentials)
                .build();

            Some(transport)
        };

        Ok(Self {
            config,
            transport,
            frontend_url,
        })
    }

    pub fn from_env(frontend_url: String) -> Result<Self, EmailError> {
        Self::new(EmailConfig::from_env()?, frontend_url)
    }

    /// メールを送信
    async fn send_email(&self, to_email: &str, subject: &str, body: String) -> Result<(), EmailError> {
        let Some(transport) = &self.transport else {
            // 開発モードではログ出力のみ
            info!(
                to_email = %to_email,
                subject = %subject,
                "EMAIL (development mode, not sent)"
            );
            return Ok(());
        };

        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.config.from_email.clone()))?;

        let to: Mailbox = to_email
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to_email.to_string()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        info!(to_email = %to_email, subject = %subject, "Email sent successfully");
        Ok(())
    }

    /// メール認証メールを送信
    pub async fn send_email_verification(
        &self,
        to_email: &str,
        verification_token: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/verify-email?token={}", self.frontend_url, verification_token);
        let body = format!(
            "Welcome to StudyRoom!\n\n\
             Please verify your email address by opening the link below:\n\n\
             {}\n\n\
             This link expires in 24 hours. If you did not create an account, \
             you can ignore this email.\n",
            url
        );

        self.send_email(to_email, "Verify your StudyRoom email address", body)
            .await
    }

    /// パスワードリセットメールを送信
    pub async fn send_password_reset(
        &self,
        to_email: &str,
        reset_token: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/reset-password?token={}", self.frontend_url, reset_token);
        let body = format!(
            "We received a request to reset your StudyRoom password.\n\n\
             Open the link below to choose a new password:\n\n\
             {}\n\n\
             This link expires in 1 hour. If you did not request a reset, \
             you can ignore this email and your password will stay unchanged.\n",
            url
        );

        self.send_email(to_email, "Reset your StudyRoom password", body)
            .await
    }

    /// ドキュメント共有通知メールを送信
    pub async fn send_document_shared(
        &self,
        to_email: &str,
        sharer_email: &str,
        document_title: &str,
        note: Option<&str>,
    ) -> Result<(), EmailError> {
        let url = format!("{}/inbox", self.frontend_url);
        let note_section = note
            .map(|n| format!("\nMessage from the sender:\n{}\n", n))
            .unwrap_or_default();
        let body = format!(
            "{} shared the document \"{}\" with you on StudyRoom.\n{}\n\
             Open your inbox to view it:\n\n\
             {}\n",
            sharer_email, document_title, note_section, url
        );

        self.send_email(
            to_email,
            &format!("{} shared a document with you", sharer_email),
            body,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_service() -> EmailService {
        EmailService::new(EmailConfig::default(), "http://localhost:5173".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_development_mode_does_not_require_smtp() {
        let service = dev_service();
        // 開発モードではSMTP接続なしで成功する
        service
            .send_email_verification("user@example.com", "tok123")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_share_notification_includes_note() {
        // 開発モードでも本文組み立て自体は実行される
        let service = dev_service();
        service
            .send_document_shared(
                "friend@example.com",
                "owner@example.com",
                "Quarterly Report",
                Some("Please review chapter 2"),
            )
            .await
            .unwrap();
    }
}
