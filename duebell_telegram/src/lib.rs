mod delivery;

pub use teloxide;

pub use delivery::{TelegramDeliveryChannel, TelegramDeliveryChannelError, get_message_text};
