use crate::ir::GrampsId;

/// Failures that abort a load or a render pass.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("malformed date {raw}")]
    MalformedDate { raw: String },

    #[error("the person {id} has no birthday")]
    PersonWithoutBirthday { id: GrampsId },

    #[error("the person {id} died before being born")]
    DeathBeforeBirth { id: GrampsId },

    #[error("unknown person {id}")]
    UnknownPerson { id: GrampsId },

    #[error("family {id} has neither parents nor children")]
    EmptyFamily { id: GrampsId },

    #[error("unknown date quality {value}")]
    UnknownQuality { value: u8 },

    #[error("unknown gender {value}")]
    UnknownGender { value: u8 },

    #[error("invalid tree file: {0}")]
    Json(#[from] serde_json::Error),
}
