use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::ai::AiClient;
use crate::broadcast;
use crate::lookup::{self, LookupClient};
use crate::store::ChatStore;
use crate::telegram::Notify;

/// One inbound chat message, already lifted out of the webhook payload.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: Option<String>,
    pub photo_file_id: Option<String>,
    pub voice_file_id: Option<String>,
}

pub const CMDS_LISTING: &str = "\
/generate_image <prompt> - Generate an AI image
/chat <message> - Chat with AI
/text_to_speech <text> - Convert text to speech
/summarize <text> - Summarize text
/generate_text <prompt> - Generate text with AI
/image_to_text <image> - Extract text from an image
/asr <audio> - Automatic speech recognition
/detect_objects <image> - Detect objects in an image
/bin_check <bin> - Check BIN information
/test_card - Generate a test card
/random_user - Generate a random user profile
/yt_download <url> - Download YouTube video
/ip_info <ip> - Get IP information
/broadcast <message> - Send broadcast message (admin only)";

pub const HELP_FALLBACK: &str =
    "I can help you with various AI tools and utilities. Use /cmds to see all available commands.";

pub const BROADCAST_DENIED: &str = "You are not authorized to broadcast messages.";

pub const BROADCAST_OK: &str = "Message broadcasted successfully.";

pub const GENERIC_FAILURE: &str =
    "Something went wrong while handling your command. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cmds,
    GenerateImage,
    Chat,
    TextToSpeech,
    Summarize,
    GenerateText,
    ImageToText,
    Asr,
    DetectObjects,
    BinCheck,
    TestCard,
    RandomUser,
    YtDownload,
    IpInfo,
    Broadcast,
}

impl Command {
    /// Exact-match lookup on the command token. No prefix matching, so a
    /// command whose name starts with another's never misroutes.
    fn from_token(token: &str) -> Option<Command> {
        match token {
            "/cmds" => Some(Command::Cmds),
            "/generate_image" => Some(Command::GenerateImage),
            "/chat" => Some(Command::Chat),
            "/text_to_speech" => Some(Command::TextToSpeech),
            "/summarize" => Some(Command::Summarize),
            "/generate_text" => Some(Command::GenerateText),
            "/image_to_text" => Some(Command::ImageToText),
            "/asr" => Some(Command::Asr),
            "/detect_objects" => Some(Command::DetectObjects),
            "/bin_check" => Some(Command::BinCheck),
            "/test_card" => Some(Command::TestCard),
            "/random_user" => Some(Command::RandomUser),
            "/yt_download" => Some(Command::YtDownload),
            "/ip_info" => Some(Command::IpInfo),
            "/broadcast" => Some(Command::Broadcast),
            _ => None,
        }
    }
}

/// Split a message text into its command and argument. The argument is
/// everything after the first whitespace, trimmed. Telegram clients may
/// append `@botname` to the token; that suffix is ignored.
pub fn parse_command(text: &str) -> Option<(Command, String)> {
    let trimmed = text.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let token = parts.next()?;
    let arg = parts.next().unwrap_or("").trim().to_string();

    let token = token.split('@').next().unwrap_or(token);
    Command::from_token(token).map(|cmd| (cmd, arg))
}

/// Routes one inbound message to its handler and sends exactly one reply,
/// whatever the adapter outcome.
pub struct Dispatcher {
    ai: AiClient,
    lookup: LookupClient,
    store: ChatStore,
    notifier: Arc<dyn Notify>,
    admin_chat_id: i64,
}

impl Dispatcher {
    pub fn new(
        ai: AiClient,
        lookup: LookupClient,
        store: ChatStore,
        notifier: Arc<dyn Notify>,
        admin_chat_id: i64,
    ) -> Self {
        Self {
            ai,
            lookup,
            store,
            notifier,
            admin_chat_id,
        }
    }

    /// Handle one inbound message end to end. Adapter failures are
    /// captured here and turned into a user-facing failure notice; the
    /// single reply guarantee holds on every path.
    pub async fn handle(&self, msg: &IncomingMessage) -> Result<()> {
        let reply = match msg.text.as_deref().and_then(parse_command) {
            Some((cmd, arg)) => {
                info!("Dispatching {:?} for chat {}", cmd, msg.chat_id);
                match self.run(cmd, &arg, msg).await {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Command {:?} failed: {:#}", cmd, e);
                        GENERIC_FAILURE.to_string()
                    }
                }
            }
            None => HELP_FALLBACK.to_string(),
        };

        self.notifier.send_message(msg.chat_id, &reply).await
    }

    async fn run(&self, cmd: Command, arg: &str, msg: &IncomingMessage) -> Result<String> {
        match cmd {
            Command::Cmds => Ok(CMDS_LISTING.to_string()),
            Command::GenerateImage => match nonempty(arg) {
                Some(prompt) => {
                    let url = self.ai.generate_image(prompt).await?;
                    Ok(format!("Here is your AI-generated image: {}", url))
                }
                None => Ok("Usage: /generate_image <prompt>".to_string()),
            },
            Command::Chat => match nonempty(arg) {
                Some(prompt) => self.ai.chat(prompt).await,
                None => Ok("Usage: /chat <message>".to_string()),
            },
            Command::TextToSpeech => match nonempty(arg) {
                Some(text) => {
                    let url = self.ai.text_to_speech(text).await?;
                    Ok(format!("Here is your audio: {}", url))
                }
                None => Ok("Usage: /text_to_speech <text>".to_string()),
            },
            Command::Summarize => match nonempty(arg) {
                Some(text) => self.ai.summarize(text).await,
                None => Ok("Usage: /summarize <text>".to_string()),
            },
            Command::GenerateText => match nonempty(arg) {
                Some(prompt) => self.ai.generate_text(prompt).await,
                None => Ok("Usage: /generate_text <prompt>".to_string()),
            },
            Command::ImageToText => match msg.photo_file_id.as_deref() {
                Some(file_id) => self.ai.image_to_text(file_id).await,
                None => Ok("Send a photo together with /image_to_text.".to_string()),
            },
            Command::Asr => match msg.voice_file_id.as_deref() {
                Some(file_id) => self.ai.transcribe(file_id).await,
                None => Ok("Send a voice message together with /asr.".to_string()),
            },
            Command::DetectObjects => match msg.photo_file_id.as_deref() {
                Some(file_id) => {
                    let objects = self.ai.detect_objects(file_id).await?;
                    Ok(format!("Detected objects: {}", objects))
                }
                None => Ok("Send a photo together with /detect_objects.".to_string()),
            },
            Command::BinCheck => match nonempty(arg) {
                Some(bin) => {
                    let info = self.lookup.bin_check(bin).await?;
                    Ok(format!("BIN Info: {}", info))
                }
                None => Ok("Usage: /bin_check <bin>".to_string()),
            },
            Command::TestCard => Ok(format!("Test Card: {}", lookup::test_card())),
            Command::RandomUser => {
                let user = self.lookup.random_user().await?;
                Ok(format!("Random User: {}", user))
            }
            Command::YtDownload => match nonempty(arg) {
                Some(url) => {
                    let link = self.lookup.yt_download(url).await?;
                    Ok(format!("Download link: {}", link))
                }
                None => Ok("Usage: /yt_download <url>".to_string()),
            },
            Command::IpInfo => match nonempty(arg) {
                Some(ip) => {
                    let info = self.lookup.ip_info(ip).await?;
                    Ok(format!("IP Info: {}", info))
                }
                None => Ok("Usage: /ip_info <ip>".to_string()),
            },
            Command::Broadcast => {
                if msg.chat_id != self.admin_chat_id {
                    return Ok(BROADCAST_DENIED.to_string());
                }
                match nonempty(arg) {
                    Some(text) => {
                        let report =
                            broadcast::fan_out(&self.store, self.notifier.as_ref(), text).await?;
                        if report.all_sent() {
                            Ok(BROADCAST_OK.to_string())
                        } else {
                            Ok(format!(
                                "Broadcast finished: {} sent, {} failed.",
                                report.sent, report.failed
                            ))
                        }
                    }
                    None => Ok("Usage: /broadcast <message>".to_string()),
                }
            }
        }
    }
}

fn nonempty(arg: &str) -> Option<&str> {
    if arg.is_empty() {
        None
    } else {
        Some(arg)
    }
}
