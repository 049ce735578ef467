pub mod package;
pub mod registry;

pub use package::{
    handle_install_command, handle_supports_command, handle_uninstall_command,
    handle_update_command,
};
pub use registry::{
    handle_config_command, handle_list_command, handle_path_command, handle_rebuild_command,
    handle_show_command,
};
