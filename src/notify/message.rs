use serde::{Deserialize, Serialize};

/// Named recipient of a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    pub username: String,
    pub email: String,
}

impl Recipient {
    pub fn new(username: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
        }
    }
}

/// Everything message rendering needs, passed explicitly instead of being
/// read from ambient request or process state.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub platform_name: String,
    pub site_name: String,
    /// The address the notification is delivered to (the account's address
    /// before this run changed it).
    pub email: String,
    pub reset_link: String,
}

/// A fully rendered message, ready for the delivery subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalizedMessage {
    pub recipient: Recipient,
    pub language: String,
    pub subject: String,
    pub body: String,
}

/// The password-reset message type.
pub struct PasswordReset;

impl PasswordReset {
    /// Render the message for a recipient in the given language. Unknown
    /// languages fall back to English; a regioned code like `es-419` picks
    /// the `es` templates.
    pub fn personalize(
        &self,
        recipient: Recipient,
        language: &str,
        context: &MessageContext,
    ) -> PersonalizedMessage {
        let lang = primary_subtag(language);

        let (subject, body) = match lang {
            "es" => (
                format!("Restablece tu contraseña de {}", context.platform_name),
                format!(
                    "Hola {username}:\n\n\
                     La dirección de correo de tu cuenta de {platform} ha sido \
                     actualizada. Para recuperar el acceso, restablece tu \
                     contraseña con el siguiente enlace:\n\n{link}\n\n\
                     Si no solicitaste este cambio, contacta con el soporte de \
                     {platform} inmediatamente.\n\n\
                     Este mensaje se ha enviado a {email}, la dirección \
                     registrada anteriormente en tu cuenta.\n\n\
                     El equipo de {platform}",
                    username = recipient.username,
                    platform = context.platform_name,
                    link = context.reset_link,
                    email = context.email,
                ),
            ),
            "fr" => (
                format!("Réinitialisez votre mot de passe {}", context.platform_name),
                format!(
                    "Bonjour {username},\n\n\
                     L'adresse e-mail de votre compte {platform} a été mise à \
                     jour. Pour récupérer l'accès, réinitialisez votre mot de \
                     passe via le lien suivant :\n\n{link}\n\n\
                     Si vous n'êtes pas à l'origine de ce changement, contactez \
                     immédiatement l'assistance {platform}.\n\n\
                     Ce message a été envoyé à {email}, l'adresse précédemment \
                     enregistrée sur votre compte.\n\n\
                     L'équipe {platform}",
                    username = recipient.username,
                    platform = context.platform_name,
                    link = context.reset_link,
                    email = context.email,
                ),
            ),
            _ => (
                format!("Reset your {} password", context.platform_name),
                format!(
                    "Hello {username},\n\n\
                     The email address on your {platform} account has been \
                     updated. To regain access, reset your password using the \
                     link below:\n\n{link}\n\n\
                     If you did not request this change, contact {platform} \
                     support immediately.\n\n\
                     This message was sent to {email}, the address previously \
                     registered to your account.\n\n\
                     The {platform} team",
                    username = recipient.username,
                    platform = context.platform_name,
                    link = context.reset_link,
                    email = context.email,
                ),
            ),
        };

        PersonalizedMessage {
            recipient,
            language: language.to_string(),
            subject,
            body,
        }
    }
}

fn primary_subtag(language: &str) -> &str {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .trim()
}
