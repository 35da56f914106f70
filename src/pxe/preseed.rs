//! Preseed rendering for the Debian family.

use crate::storage::{ConfigTemplate, Server};

pub fn render(server: &Server, template: &ConfigTemplate) -> String {
    let mut lines = vec![
        format!("# Preseed for {} ({})", server.serial, server.mac_address),
        format!(
            "# Template: {} ({} {})",
            template.name, template.system_type, template.system_version
        ),
        String::new(),
        "d-i debian-installer/locale string en_US.UTF-8".to_string(),
        "d-i keyboard-configuration/xkb-keymap select us".to_string(),
        String::new(),
        "# Network".to_string(),
    ];

    let interface = if server.lan_nic.is_empty() { "auto" } else { server.lan_nic.as_str() };
    lines.push(format!("d-i netcfg/choose_interface select {}", interface));
    if !server.ip_address.is_empty() {
        lines.push("d-i netcfg/disable_autoconfig boolean true".to_string());
        lines.push(format!("d-i netcfg/get_ipaddress string {}", server.ip_address));
        if !server.gateway.is_empty() {
            lines.push(format!("d-i netcfg/get_gateway string {}", server.gateway));
        }
        lines.push("d-i netcfg/confirm_static boolean true".to_string());
    }
    lines.push(format!("d-i netcfg/get_hostname string {}", server.hostname));
    lines.push(format!("d-i netcfg/hostname string {}", server.hostname));

    if !template.config_content.trim().is_empty() {
        lines.push(String::new());
        lines.push(template.config_content.trim_end().to_string());
    }

    if !template.kernel_params.trim().is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "d-i debian-installer/add-kernel-opts string {}",
            template.kernel_params.trim()
        ));
    }

    lines.push(String::new());
    lines.push(format!("# Packages: {}", template.packages));
    let packages = template.package_list();
    if !packages.is_empty() {
        lines.push(format!("d-i pkgsel/include string {}", packages.join(" ")));
    }

    lines.push(String::new());
    lines.push("d-i finish-install/reboot_in_progress note".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
