use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Endpoint, Record};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PositionId);
id_newtype!(TeacherId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionDraft {
    pub name: String,
}

impl Record for Position {
    type Id = PositionId;
    type Draft = PositionDraft;

    const ENDPOINT: Endpoint = Endpoint::json("positions", "position");

    fn id(&self) -> PositionId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn to_draft(&self) -> PositionDraft {
        PositionDraft {
            name: self.name.clone(),
        }
    }

    fn draft_name(draft: &PositionDraft) -> &str {
        &draft.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub telephone: String,
    /// Server-relative image path, e.g. `/uploads/1700000000-me.png`.
    #[serde(rename = "img", default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub position_id: Option<PositionId>,
    /// Joined server-side; display only.
    #[serde(default)]
    pub position_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeacherDraft {
    pub name: String,
    pub address: String,
    pub telephone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<PositionId>,
}

impl Record for Teacher {
    type Id = TeacherId;
    type Draft = TeacherDraft;

    const ENDPOINT: Endpoint = Endpoint::multipart("teachers", "teacher", "img");

    fn id(&self) -> TeacherId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn to_draft(&self) -> TeacherDraft {
        TeacherDraft {
            name: self.name.clone(),
            address: self.address.clone(),
            telephone: self.telephone.clone(),
            position_id: self.position_id,
        }
    }

    fn draft_name(draft: &TeacherDraft) -> &str {
        &draft.name
    }

    fn attachment_ref(&self) -> Option<&str> {
        self.image_ref.as_deref().filter(|path| !path.is_empty())
    }
}
