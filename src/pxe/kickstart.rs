//! Kickstart rendering for the Red Hat family.

use crate::storage::{ConfigTemplate, Server};

pub fn render(server: &Server, template: &ConfigTemplate) -> String {
    let mut lines = vec![
        "#version=RHEL8".to_string(),
        format!("# Generated for {} ({})", server.serial, server.mac_address),
        format!(
            "# Template: {} ({} {})",
            template.name, template.system_type, template.system_version
        ),
        String::new(),
        "text".to_string(),
        "lang en_US.UTF-8".to_string(),
        "keyboard us".to_string(),
        "timezone UTC --utc".to_string(),
        network_line(server),
    ];

    if !template.kernel_params.trim().is_empty() {
        lines.push(format!("bootloader --append=\"{}\"", template.kernel_params.trim()));
    }

    if !template.config_content.trim().is_empty() {
        lines.push(String::new());
        lines.push(template.config_content.trim_end().to_string());
    }

    lines.push(String::new());
    lines.push(format!("# Packages: {}", template.packages));
    lines.push("%packages".to_string());
    lines.extend(template.package_list().into_iter().map(str::to_string));
    lines.push("%end".to_string());
    lines.push(String::new());
    lines.push("reboot".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn network_line(server: &Server) -> String {
    let device = if server.lan_nic.is_empty() { "link" } else { server.lan_nic.as_str() };
    let mut line = format!("network --device={} --hostname={}", device, server.hostname);
    if server.ip_address.is_empty() {
        line.push_str(" --bootproto=dhcp");
    } else {
        line.push_str(&format!(" --bootproto=static --ip={}", server.ip_address));
        if !server.gateway.is_empty() {
            line.push_str(&format!(" --gateway={}", server.gateway));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pxe::generator::tests::{sample_server, sample_template};

    #[test]
    fn test_static_network_and_packages() {
        let out = render(&sample_server(), &sample_template("centos"));

        assert!(out.contains(
            "network --device=eth0 --hostname=node-01 --bootproto=static --ip=192.168.88.10 --gateway=192.168.88.1"
        ));
        assert!(out.contains("bootloader --append=\"console=ttyS0\""));
        assert!(out.contains("%packages\nvim\nnet-tools\n%end"));
        assert!(out.contains("vim,net-tools"));
        assert!(out.ends_with("reboot\n"));
    }

    #[test]
    fn test_dhcp_when_no_address() {
        let mut server = sample_server();
        server.ip_address.clear();
        server.lan_nic.clear();

        let out = render(&server, &sample_template("rhel"));
        assert!(out.contains("network --device=link --hostname=node-01 --bootproto=dhcp"));
        assert!(!out.contains("--gateway"));
    }
}
