//! "Do not edit" disclaimer attached to every managed resource

use crate::resource::Resource;

/// Annotation key for the disclaimer of `manager`
pub fn disclaimer_key(manager: &str) -> String {
    format!("{manager}.kyma-project.io/managed-by-{manager}-disclaimer")
}

/// Disclaimer text for `manager`
pub fn disclaimer_message(manager: &str) -> String {
    format!(
        "DO NOT EDIT - This resource is managed by {manager}.\nAny modifications are discarded and the resource is reverted to the original state."
    )
}

/// Add the disclaimer annotation, keeping existing annotations
pub fn add_do_not_edit_disclaimer(manager: &str, resource: &mut Resource) {
    resource.set_annotation(&disclaimer_key(manager), &disclaimer_message(manager));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_disclaimer() {
        let mut resource = Resource::default();
        add_do_not_edit_disclaimer("reconciler", &mut resource);

        insta::assert_snapshot!(
            resource.annotation(&disclaimer_key("reconciler")).unwrap(),
            @r"
        DO NOT EDIT - This resource is managed by reconciler.
        Any modifications are discarded and the resource is reverted to the original state.
        "
        );
    }

    #[test]
    fn test_disclaimer_key() {
        assert_eq!(
            disclaimer_key("serverless"),
            "serverless.kyma-project.io/managed-by-serverless-disclaimer"
        );
    }

    #[test]
    fn test_existing_annotations_preserved() {
        let mut resource = Resource::new("v1", "ConfigMap", "cm").with_annotation("owner", "me");
        add_do_not_edit_disclaimer("op", &mut resource);

        assert_eq!(resource.annotation("owner"), Some("me"));
        assert_eq!(resource.annotations().len(), 2);
    }
}
