use crate::{CoreError, Instance};
use isctl_runtime::{credential_for, Credential};
use isctl_schema::{IdentityKeys, ParameterStore, PARAMETERS_FILE};
use std::path::PathBuf;
use tracing::debug;

impl Instance {
    pub fn parameters_path(&self) -> PathBuf {
        self.directory.join(PARAMETERS_FILE)
    }

    /// Parse the instance's `parameters.isc`.
    pub fn parameters(&self) -> Result<ParameterStore, CoreError> {
        Ok(ParameterStore::load(self.parameters_path())?)
    }

    fn determine(&self, keys: IdentityKeys) -> Result<(String, String), CoreError> {
        let path = self.parameters_path();
        let params = ParameterStore::load(&path)?;
        let lookup = |key: &'static str| match params.value(key) {
            "" => Err(CoreError::MissingIdentity {
                key,
                path: path.clone(),
            }),
            v => Ok(v.to_owned()),
        };
        Ok((lookup(keys.user)?, lookup(keys.group)?))
    }

    /// User and group allowed to start and stop the instance.
    pub fn determine_manager(&self) -> Result<(String, String), CoreError> {
        self.determine(self.product.manager_keys())
    }

    /// User and group owning the instance's files.
    pub fn determine_owner(&self) -> Result<(String, String), CoreError> {
        self.determine(self.product.owner_keys())
    }

    /// Run every tool spawned from now on as `user`.
    ///
    /// Asking for the user this process already runs as clears the
    /// credential. Any other user requires root.
    pub fn as_user(&mut self, user: &str) -> Result<(), CoreError> {
        self.credential = credential_for(user)?;
        debug!(instance = %self.name, user, switched = self.credential.is_some(), "execution user set");
        Ok(())
    }

    pub fn as_manager(&mut self) -> Result<(), CoreError> {
        let (user, _) = self.determine_manager()?;
        self.as_user(&user)
    }

    pub fn as_owner(&mut self) -> Result<(), CoreError> {
        let (user, _) = self.determine_owner()?;
        self.as_user(&user)
    }

    pub fn as_current_user(&mut self) {
        debug!(instance = %self.name, "removing execution user");
        self.credential = None;
    }

    /// Credential for start/stop actions, which run as the manager.
    pub(crate) fn manager_credential(&self) -> Result<Option<Credential>, CoreError> {
        let (user, _) = self.determine_manager()?;
        Ok(credential_for(&user)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isctl_runtime::current_user_name;
    use isctl_schema::Product;

    fn instance_with_params(product: Product, params: &str) -> (tempfile::TempDir, Instance) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PARAMETERS_FILE), params).unwrap();
        let inst = Instance {
            name: "TEST".to_owned(),
            directory: dir.path().to_path_buf(),
            product,
            ..Instance::default()
        };
        (dir, inst)
    }

    const PARAMS: &str = "\
security_settings.manager_user: mgr
security_settings.manager_group: mgrgrp
security_settings.cache_user: cacheusr
security_settings.cache_group: cachegrp
security_settings.iris_user: irisusr
security_settings.iris_group: irisgrp
";

    #[test]
    fn manager_keys_are_shared() {
        for product in [Product::Cache, Product::Ensemble, Product::Iris] {
            let (_dir, inst) = instance_with_params(product, PARAMS);
            assert_eq!(
                inst.determine_manager().unwrap(),
                ("mgr".to_owned(), "mgrgrp".to_owned())
            );
        }
    }

    #[test]
    fn owner_keys_depend_on_product() {
        let (_dir, inst) = instance_with_params(Product::Ensemble, PARAMS);
        assert_eq!(
            inst.determine_owner().unwrap(),
            ("cacheusr".to_owned(), "cachegrp".to_owned())
        );
        let (_dir, inst) = instance_with_params(Product::Iris, PARAMS);
        assert_eq!(
            inst.determine_owner().unwrap(),
            ("irisusr".to_owned(), "irisgrp".to_owned())
        );
    }

    #[test]
    fn empty_group_is_missing() {
        let (_dir, inst) = instance_with_params(
            Product::Cache,
            "security_settings.manager_user: mgr\nsecurity_settings.manager_group:\n",
        );
        let err = inst.determine_manager().unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingIdentity {
                key: "security_settings.manager_group",
                ..
            }
        ));
    }

    #[test]
    fn ambiguous_user_is_missing() {
        let (_dir, inst) = instance_with_params(
            Product::Cache,
            "security_settings.cache_user: a\nsecurity_settings.cache_user: b\nsecurity_settings.cache_group: g\n",
        );
        assert!(inst.determine_owner().is_err());
    }

    #[test]
    fn missing_parameters_file_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let inst = Instance {
            directory: dir.path().to_path_buf(),
            ..Instance::default()
        };
        assert!(matches!(
            inst.determine_owner().unwrap_err(),
            CoreError::Schema(_)
        ));
    }

    #[test]
    fn as_manager_for_current_user_clears_credential() {
        let me = current_user_name().unwrap();
        let params = format!(
            "security_settings.manager_user: {me}\nsecurity_settings.manager_group: {me}\n"
        );
        let (_dir, mut inst) = instance_with_params(Product::Cache, &params);
        inst.as_manager().unwrap();
        assert!(inst.credential().is_none());
        assert!(inst.manager_credential().unwrap().is_none());
    }

    #[test]
    fn as_current_user_clears_credential() {
        let (_dir, mut inst) = instance_with_params(Product::Cache, PARAMS);
        inst.credential = Some(Credential {
            user: "cacheusr".to_owned(),
            uid: nix::unistd::Uid::from_raw(1001),
            gid: nix::unistd::Gid::from_raw(1001),
        });
        inst.as_current_user();
        assert!(inst.credential().is_none());
    }
}
