//! GRUB menu for UEFI clients.
//!
//! UEFI machines load one shared `grub.cfg`, so the descriptor points the
//! installer at the per-MAC document already published for legacy PXE.

use crate::storage::{ConfigTemplate, Server};

use super::generator::BootFamily;

pub fn render(
    family: BootFamily,
    server: &Server,
    template: &ConfigTemplate,
    document_url: &str,
) -> String {
    let os = template.system_type.to_ascii_lowercase();
    let installer_args = match family {
        BootFamily::Kickstart => format!("inst.ks={} ip=dhcp", document_url),
        BootFamily::Preseed => format!("auto=true priority=critical url={}", document_url),
    };
    let mut cmdline = installer_args;
    if !template.kernel_params.trim().is_empty() {
        cmdline.push(' ');
        cmdline.push_str(template.kernel_params.trim());
    }

    format!(
        "set default=0\n\
         set timeout=5\n\
         \n\
         menuentry 'Install {name} on {hostname} ({serial})' {{\n\
         \x20   linuxefi /images/{os}/{version}/vmlinuz {cmdline}\n\
         \x20   initrdefi /images/{os}/{version}/initrd.img\n\
         }}\n",
        name = template.name,
        hostname = server.hostname,
        serial = server.serial,
        os = os,
        version = template.system_version,
        cmdline = cmdline,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pxe::generator::tests::{sample_server, sample_template};

    const URL: &str = "http://192.168.88.1/pxelinux.cfg/01-aa-bb-cc-dd-ee-ff";

    #[test]
    fn test_kickstart_entry() {
        let out = render(BootFamily::Kickstart, &sample_server(), &sample_template("CentOS"), URL);

        assert!(out.contains(&format!("inst.ks={} ip=dhcp console=ttyS0", URL)));
        assert!(out.contains("linuxefi /images/centos/7/vmlinuz"));
        assert!(out.contains("initrdefi /images/centos/7/initrd.img"));
        assert!(out.contains("menuentry 'Install base on node-01 (SN001)' {"));
    }

    #[test]
    fn test_preseed_entry() {
        let out = render(BootFamily::Preseed, &sample_server(), &sample_template("ubuntu"), URL);
        assert!(out.contains(&format!("auto=true priority=critical url={}", URL)));
    }
}
