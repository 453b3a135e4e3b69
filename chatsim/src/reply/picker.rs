//! Canned response selection.
//!
//! Attachment types answer with a fixed acknowledgement. Text is matched
//! against keyword groups in priority order; the first group with any
//! keyword contained in the lowercased text wins.

use chatsim_proto::message::MessageType;

/// Acknowledgement for photos.
pub const PHOTO_REPLY: &str = "Terima kasih sudah mengirim fotonya 📸";

/// Acknowledgement for videos.
pub const VIDEO_REPLY: &str = "Video sudah diterima dengan baik 🎥";

/// Acknowledgement for documents.
pub const DOCUMENT_REPLY: &str = "Dokumen sudah saya terima 📄";

/// Reply for greetings.
pub const GREETING_REPLY: &str = "Halo! Ada yang bisa saya bantu? 😊";

/// Reply for payment mentions.
pub const PAYMENT_REPLY: &str = "Baik, terima kasih. Saya akan proses pembayaran Anda segera 💳";

/// Reply for thanks.
pub const THANKS_REPLY: &str = "Sama-sama! Senang bisa membantu 😊";

/// Reply for questions.
pub const QUESTION_REPLY: &str = "Baik, biarkan saya cek informasinya dulu ya";

/// Reply for food mentions.
pub const FOOD_REPLY: &str = "Wah makan nih! Selamat makan ya! 🍽️";

/// Reply when nothing else matches.
pub const FALLBACK_REPLY: &str = "Baik, saya sudah menerima pesannya";

/// Keyword groups, highest priority first.
const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["halo", "hai", "hello", "selamat"], GREETING_REPLY),
    (&["pembayaran", "bayar", "bukti"], PAYMENT_REPLY),
    (&["foto", "gambar", "image"], PHOTO_REPLY),
    (&["video"], VIDEO_REPLY),
    (&["pdf", "dokumen", "file"], DOCUMENT_REPLY),
    (&["terima kasih", "thanks", "makasih"], THANKS_REPLY),
    (&["?"], QUESTION_REPLY),
    (&["makan"], FOOD_REPLY),
];

/// Picks the scripted response for a message.
#[must_use]
pub fn pick_reply(text: &str, kind: MessageType) -> &'static str {
    match kind {
        MessageType::Image => return PHOTO_REPLY,
        MessageType::Video => return VIDEO_REPLY,
        MessageType::Pdf => return DOCUMENT_REPLY,
        MessageType::Text => {}
    }

    let text = text.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map_or(FALLBACK_REPLY, |(_, reply)| reply)
}
