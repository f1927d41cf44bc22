// -
// Change feed protocol

/// Version token meaning "full snapshot requested"
pub(crate) const INITIAL_VERSION: &str = "";

/// Field carrying the synthetic element key of sequence elements,
/// e.g. `config.hardware.device["4000"]` matches the element whose `key` is 4000
pub(crate) const ELEMENT_KEY_FIELD: &str = "key";

// -
// Traversal step names shared by the selection strategies

pub(crate) const CONTAINER_VIEW_STEP: &str = "ContainerView.container";
pub(crate) const VISIT_FOLDERS_STEP: &str = "visitFolders";

/// Property observed on tasks when no explicit paths are given
pub(crate) const TASK_STATE_PATH: &str = "info.state";

// -
// Settings

/// Prefix of environment variables overriding collector settings
pub(crate) const SETTINGS_ENV_PREFIX: &str = "PROPSYNC";
