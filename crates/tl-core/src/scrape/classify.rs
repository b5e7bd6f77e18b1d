use super::model::ServerStatus;

/// Maps the markup of a server's status icon to a [`ServerStatus`].
///
/// Implementations must be total: any input yields a status, falling back to
/// [`ServerStatus::Unknown`].
pub trait StatusClassifier: Send + Sync {
    fn classify(&self, token: &str) -> ServerStatus;
}

/// Fill colors in priority order; the first contained color wins.
const COLOR_RULES: [(&str, ServerStatus); 4] = [
    ("24FF00", ServerStatus::Good),
    ("FFF500", ServerStatus::Busy),
    ("FF0000", ServerStatus::Full),
    ("00F0FF", ServerStatus::InMaintenance),
];

/// Classifies by the hex fill color embedded in the icon markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorClassifier;

impl StatusClassifier for ColorClassifier {
    fn classify(&self, token: &str) -> ServerStatus {
        classify(token)
    }
}

pub fn classify(token: &str) -> ServerStatus {
    COLOR_RULES
        .iter()
        .find(|(color, _)| token.contains(color))
        .map(|(_, status)| *status)
        .unwrap_or(ServerStatus::Unknown)
}
