// ── Hubchat: Wire Protocol ─────────────────────────────────────────────────
// One named event type carrying exactly two ordered string fields, framed as
// a JSON array: ["SendMessage", sender, text] from client to hub and
// ["ReceiveMessage", sender, text] from hub to every connected client
// (the original sender included; self-echo filtering is the session's job).
//
// No message IDs, timestamps, or acknowledgement numbers. Send success means
// the frame reached the transport; reliability beyond that is the
// transport's concern.

/// Event tag for client → hub frames.
pub const OUTBOUND_EVENT: &str = "SendMessage";

/// Event tag for hub → client frames.
pub const INBOUND_EVENT: &str = "ReceiveMessage";

/// A decoded chat event: who said what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub sender: String,
    pub text: String,
}

impl ChatEvent {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self { sender: sender.into(), text: text.into() }
    }

    /// Encode as a client → hub frame.
    pub fn encode_outbound(&self) -> String {
        serde_json::json!([OUTBOUND_EVENT, self.sender, self.text]).to_string()
    }

    /// Encode as a hub → client frame. Used by hub implementations and tests;
    /// the client itself only ever decodes this direction.
    pub fn encode_inbound(&self) -> String {
        serde_json::json!([INBOUND_EVENT, self.sender, self.text]).to_string()
    }

    /// Decode a hub → client frame. Returns `None` for anything that is not
    /// a well-formed three-element `["ReceiveMessage", sender, text]` array;
    /// callers skip such frames rather than failing the connection.
    pub fn decode_inbound(raw: &str) -> Option<Self> {
        Self::decode(raw, INBOUND_EVENT)
    }

    /// Decode a client → hub frame (hub side / tests).
    pub fn decode_outbound(raw: &str) -> Option<Self> {
        Self::decode(raw, OUTBOUND_EVENT)
    }

    fn decode(raw: &str, tag: &str) -> Option<Self> {
        let arr: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
        if arr.len() != 3 || arr[0].as_str()? != tag {
            return None;
        }
        Some(Self { sender: arr[1].as_str()?.to_string(), text: arr[2].as_str()?.to_string() })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
