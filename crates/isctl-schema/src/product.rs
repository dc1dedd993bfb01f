use serde::{Deserialize, Serialize};

/// One of the products sharing the Caché administrative toolchain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    #[default]
    Cache,
    Ensemble,
    Iris,
}

/// The `parameters.isc` keys holding a user and its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityKeys {
    pub user: &'static str,
    pub group: &'static str,
}

const MANAGER_KEYS: IdentityKeys = IdentityKeys {
    user: "security_settings.manager_user",
    group: "security_settings.manager_group",
};

const CACHE_OWNER_KEYS: IdentityKeys = IdentityKeys {
    user: "security_settings.cache_user",
    group: "security_settings.cache_group",
};

const IRIS_OWNER_KEYS: IdentityKeys = IdentityKeys {
    user: "security_settings.iris_user",
    group: "security_settings.iris_group",
};

impl Product {
    /// Parse the product column of a qlist record.
    ///
    /// Unknown and empty strings yield `Cache`; newer tool versions add
    /// product names faster than this list grows.
    pub fn parse(product: &str) -> Self {
        match product {
            "Ensemble" => Self::Ensemble,
            "IDP" => Self::Iris,
            p if p.starts_with("IRIS") => Self::Iris,
            _ => Self::Cache,
        }
    }

    /// Name of the database file inside each database directory.
    pub fn dat_file_name(self) -> &'static str {
        match self {
            Self::Cache | Self::Ensemble => "CACHE.DAT",
            Self::Iris => "IRIS.DAT",
        }
    }

    /// Keys naming the user that owns the instance's files.
    pub fn owner_keys(self) -> IdentityKeys {
        match self {
            Self::Cache | Self::Ensemble => CACHE_OWNER_KEYS,
            Self::Iris => IRIS_OWNER_KEYS,
        }
    }

    /// Keys naming the user allowed to start and stop the instance.
    pub fn manager_keys(self) -> IdentityKeys {
        MANAGER_KEYS
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "Cache"),
            Self::Ensemble => write!(f, "Ensemble"),
            Self::Iris => write!(f, "IRIS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_products_default_to_cache() {
        assert_eq!(Product::parse(""), Product::Cache);
        assert_eq!(Product::parse("NotAProduct"), Product::Cache);
        assert_eq!(Product::parse("Cache"), Product::Cache);
    }

    #[test]
    fn known_products_parse() {
        assert_eq!(Product::parse("Ensemble"), Product::Ensemble);
        assert_eq!(Product::parse("IRIS"), Product::Iris);
        assert_eq!(Product::parse("IRISHealth"), Product::Iris);
        assert_eq!(Product::parse("IDP"), Product::Iris);
    }

    #[test]
    fn iris_uses_its_own_owner_keys() {
        assert_eq!(Product::Iris.owner_keys().user, "security_settings.iris_user");
        assert_eq!(
            Product::Ensemble.owner_keys().group,
            "security_settings.cache_group"
        );
        assert_eq!(Product::Iris.manager_keys(), Product::Cache.manager_keys());
    }

    #[test]
    fn dat_file_names() {
        assert_eq!(Product::Cache.dat_file_name(), "CACHE.DAT");
        assert_eq!(Product::Iris.dat_file_name(), "IRIS.DAT");
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Product::Iris).unwrap();
        assert_eq!(json, "\"iris\"");
    }
}
