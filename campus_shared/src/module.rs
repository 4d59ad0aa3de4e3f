use serde::{Deserialize, Serialize};

/// A cohort-selection unit: one role plus one private category of channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    name: String,
    role_id: u64,
    category_id: u64,
    created: String,
}

impl Module {
    pub fn new(name: String, role_id: u64, category_id: u64) -> Self {
        Self {
            name,
            role_id,
            category_id,
            created: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_role_id(&self) -> u64 {
        self.role_id
    }

    pub fn get_category_id(&self) -> u64 {
        self.category_id
    }

    pub fn get_created(&self) -> &str {
        &self.created
    }
}
