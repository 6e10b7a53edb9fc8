//! Startup (next-boot) image selection.

use indexmap::IndexMap;
use serde::Serialize;

use super::{Submission, reply_root};
use crate::connection::{GetQuery, NetworkApi, Reply, SessionHandle};
use crate::device::{Device, OperationKind, Payload};
use crate::error::{ConnectionError, Result};
use crate::xml::{Element, ElementMaker, NCDATA, find_all_in_data};

/// Images to boot from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootImage {
    /// A single IPE package.
    Ipe { file: String, delete_after: bool },
    /// Separate boot and system images.
    BootSystem { boot: String, system: String },
}

/// Boot, system and patch files of one boot list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BootImages {
    pub boot: String,
    pub system: String,
    pub patch: String,
}

/// Sets the main startup images.
#[derive(Debug, Clone)]
pub struct SetStartup {
    image: BootImage,
    patch: Option<String>,
}

impl SetStartup {
    pub fn new(image: BootImage) -> Self {
        Self { image, patch: None }
    }

    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = Some(patch.into());
        self
    }

    /// Current and startup images, keyed `current`, `startup-primary` and
    /// `startup-backup`. File names lose their `flash:/` style prefix.
    pub async fn get_reboot_config<H: SessionHandle>(
        device: &mut Device<H>,
    ) -> Result<IndexMap<String, BootImages>> {
        let e = ElementMaker::data();
        let query = e.node(
            "top",
            [e.node("Package", [e.node("BootLoaderList", [e.empty("BootList")])])],
        );
        let reply = device.get(Some(&GetQuery::Subtree(query))).await?;

        let mut images = IndexMap::new();
        if let Some(root) = reply_root(&reply) {
            for list in find_all_in_data("BootList", root) {
                if let Some((kind, entry)) = boot_list(list) {
                    images.insert(kind.to_string(), entry);
                }
            }
        }
        Ok(images)
    }

    /// The payload and how it is sent.
    ///
    /// With a patch the `boot-loader` CLI is used, answering its prompts;
    /// otherwise a `SetBootImage` action. The answers ride in the CLI rpc
    /// as plain lines, so the patch path needs NETCONF: an SSH shell would
    /// wait for a view prompt the `[Y/N]` question never gives.
    pub fn payload(&self) -> (Payload, OperationKind) {
        match &self.patch {
            Some(patch) => (Payload::Lines(self.patch_commands(patch)), OperationKind::CliDisplay),
            None => (Payload::Xml(self.action()), OperationKind::Action),
        }
    }

    fn patch_commands(&self, patch: &str) -> Vec<String> {
        match &self.image {
            BootImage::Ipe { file, .. } => vec![
                format!("boot-loader file {file} patch {patch} all main"),
                "y\ny\ny\n".to_string(),
            ],
            BootImage::BootSystem { boot, system } => vec![
                format!("boot-loader file boot {boot} system {system} patch {patch} all main"),
                "y".to_string(),
            ],
        }
    }

    fn action(&self) -> Element {
        let a = ElementMaker::action();
        let mut set = a.node("SetBootImage", [a.leaf("Type", "1"), a.leaf("OverwriteLocalFile", "false")]);
        match &self.image {
            BootImage::Ipe { file, delete_after } => {
                set.push(a.leaf("IPEFileName", file.as_str()));
                set.push(a.leaf("DeleteIPEFile", delete_after.to_string()));
            }
            BootImage::BootSystem { boot, system } => {
                set.push(a.node(
                    "ImageFiles",
                    [a.leaf("Boot", boot.as_str()), a.leaf("System", system.as_str())],
                ));
            }
        }
        a.node("top", [a.node("Package", [set])])
    }

    /// Stage the change, or send it now.
    ///
    /// A patch over cliconf is refused before anything is staged or sent.
    pub async fn build<H: SessionHandle>(&self, device: &mut Device<H>, stage: bool) -> Result<Submission> {
        if self.patch.is_some() && device.connection().await?.network_api() == NetworkApi::Cliconf {
            return Err(ConnectionError::UnsupportedOperation {
                operation: "boot-loader patch",
                network_api: "cliconf",
            }
            .into());
        }
        let (payload, kind) = self.payload();
        if stage {
            device.stage_config(payload, kind.as_str())?;
            return Ok(Submission::Staged);
        }
        let reply = match payload {
            Payload::Xml(element) => device.action(&element).await?,
            other => Reply::Text(device.cli_display(other).await?),
        };
        Ok(Submission::Sent(reply))
    }
}

fn boot_list(list: &Element) -> Option<(&'static str, BootImages)> {
    let kind = match list.find_text(NCDATA, "BootType")? {
        "0" => "current",
        "1" => "startup-primary",
        "2" => "startup-backup",
        _ => return None,
    };
    let files: Vec<&str> = list
        .find_all(NCDATA, "FileName")
        .into_iter()
        .map(|f| strip_device(f.text().unwrap_or_default()))
        .collect();

    match files.as_slice() {
        [boot, system, rest @ ..] => Some((
            kind,
            BootImages {
                boot: boot.to_string(),
                system: system.to_string(),
                patch: rest.first().map(|p| p.to_string()).unwrap_or_default(),
            },
        )),
        _ => None,
    }
}

fn strip_device(path: &str) -> &str {
    path.split_once(":/").map_or(path, |(_, file)| file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::{Call, MockSession, calls};
    use crate::error::Error;

    const BOOT_REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <data>
    <top xmlns="http://www.h3c.com/netconf/data:1.0">
      <Package><BootLoaderList>
        <BootList><BootType>0</BootType>
          <Files><FileName>flash:/boot-7.1.bin</FileName><FileName>flash:/system-7.1.bin</FileName></Files>
        </BootList>
        <BootList><BootType>1</BootType>
          <Files><FileName>flash:/boot-7.2.bin</FileName><FileName>flash:/system-7.2.bin</FileName><FileName>flash:/patch-7.2.bin</FileName></Files>
        </BootList>
        <BootList><BootType>2</BootType>
          <Files><FileName>flash:/boot-7.0.bin</FileName></Files>
        </BootList>
      </BootLoaderList></Package>
    </top>
  </data>
</rpc-reply>"#;

    #[test]
    fn test_ipe_action() {
        let startup = SetStartup::new(BootImage::Ipe {
            file: "flash:/s5130.ipe".to_string(),
            delete_after: false,
        });
        let (payload, kind) = startup.payload();
        assert_eq!(kind, OperationKind::Action);
        let xml = match payload {
            Payload::Xml(element) => element.to_xml().unwrap(),
            other => panic!("expected xml, got {other:?}"),
        };
        assert_eq!(
            xml,
            concat!(
                r#"<top xmlns="http://www.h3c.com/netconf/action:1.0"><Package><SetBootImage>"#,
                "<Type>1</Type><OverwriteLocalFile>false</OverwriteLocalFile>",
                "<IPEFileName>flash:/s5130.ipe</IPEFileName><DeleteIPEFile>false</DeleteIPEFile>",
                "</SetBootImage></Package></top>"
            )
        );
    }

    #[test]
    fn test_boot_system_action() {
        let startup = SetStartup::new(BootImage::BootSystem {
            boot: "flash:/boot.bin".to_string(),
            system: "flash:/system.bin".to_string(),
        });
        let (payload, _) = startup.payload();
        let Payload::Xml(element) = payload else {
            panic!("expected xml payload");
        };
        assert_eq!(
            element.find_text(crate::xml::NCACTION, "System"),
            Some("flash:/system.bin")
        );
    }

    #[test]
    fn test_patch_uses_cli() {
        let startup = SetStartup::new(BootImage::Ipe {
            file: "flash:/s5130.ipe".to_string(),
            delete_after: true,
        })
        .with_patch("flash:/patch.bin");
        assert_eq!(
            startup.payload(),
            (
                Payload::Lines(vec![
                    "boot-loader file flash:/s5130.ipe patch flash:/patch.bin all main".to_string(),
                    "y\ny\ny\n".to_string(),
                ]),
                OperationKind::CliDisplay
            )
        );
    }

    #[tokio::test]
    async fn test_get_reboot_config() {
        let mut device = Device::open(MockSession::netconf().reply(BOOT_REPLY)).await.unwrap();
        let images = SetStartup::get_reboot_config(&mut device).await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images["current"].boot, "boot-7.1.bin");
        assert_eq!(images["current"].patch, "");
        assert_eq!(images["startup-primary"].patch, "patch-7.2.bin");
        assert!(!images.contains_key("startup-backup"));
    }

    #[tokio::test]
    async fn test_build_stages_action() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut device = Device::open(session).await.unwrap();

        let startup = SetStartup::new(BootImage::BootSystem {
            boot: "flash:/boot.bin".to_string(),
            system: "flash:/system.bin".to_string(),
        });
        assert_eq!(startup.build(&mut device, true).await.unwrap(), Submission::Staged);
        device.execute_staged().await.unwrap();

        assert!(matches!(&calls(&log)[1], Call::Rpc(body) if body.starts_with("<action><top")));
    }

    #[tokio::test]
    async fn test_patch_is_refused_over_cliconf() {
        let session = MockSession::cliconf();
        let log = session.log();
        let mut device = Device::open(session).await.unwrap();

        let startup = SetStartup::new(BootImage::Ipe {
            file: "flash:/s5130.ipe".to_string(),
            delete_after: false,
        })
        .with_patch("flash:/patch.bin");
        for stage in [true, false] {
            assert!(matches!(
                startup.build(&mut device, stage).await,
                Err(Error::Connection(ConnectionError::UnsupportedOperation {
                    operation: "boot-loader patch",
                    network_api: "cliconf"
                }))
            ));
        }
        assert!(device.staged().is_empty());
        assert_eq!(calls(&log), vec![Call::Capabilities]);
    }

    #[tokio::test]
    async fn test_patch_is_staged_over_netconf() {
        let mut device = Device::open(MockSession::netconf()).await.unwrap();
        let startup = SetStartup::new(BootImage::BootSystem {
            boot: "flash:/boot.bin".to_string(),
            system: "flash:/system.bin".to_string(),
        })
        .with_patch("flash:/patch.bin");

        assert_eq!(startup.build(&mut device, true).await.unwrap(), Submission::Staged);
        assert_eq!(device.staged().len(), 1);
    }
}
