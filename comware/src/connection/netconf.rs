//! Facade for NETCONF sessions.
//!
//! Builds the rpc bodies Comware understands and parses the replies. CLI
//! commands are tunneled through the `<CLI>` rpc: `Execution` for display
//! commands, `Configuration` for configuration commands.

use log::{debug, info, warn};

use super::{Datastore, GetQuery, Reply, SessionHandle, is_expected_disconnect};
use crate::error::{ConnectionError, Result};
use crate::xml::{Attribute, Element, ElementMaker, NETCONFBASE};

/// NETCONF-backed connection.
#[derive(Debug)]
pub struct NetconfConnection<H> {
    handle: H,
}

impl<H: SessionHandle> NetconfConnection<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    pub async fn get(&mut self, query: &GetQuery) -> Result<Reply> {
        match query {
            GetQuery::Subtree(filter) => {
                let nc = ElementMaker::netconf();
                let body = nc.node(
                    "get",
                    [nc.node("filter", [filter.clone()])
                        .with_attributes([Attribute::new(None, "type", "subtree")])],
                );
                self.call(&body.to_xml()?).await
            }
            GetQuery::Command(command) => self.cli_display(std::slice::from_ref(command)).await,
        }
    }

    pub async fn edit_config(&mut self, config: &str, target: Datastore) -> Result<Reply> {
        let body = format!("<edit-config><target><{target}/></target>{config}</edit-config>");
        self.call(&body).await
    }

    pub async fn action(&mut self, element: &str) -> Result<Reply> {
        self.call(&format!("<action>{element}</action>")).await
    }

    pub async fn save(&mut self, filename: Option<&str>) -> Result<Reply> {
        let nc = ElementMaker::netconf();
        let mut body = nc.empty("save");
        if let Some(filename) = filename {
            body.push(nc.leaf("file", filename));
        }
        self.call(&body.to_xml()?).await
    }

    pub async fn rollback(&mut self, filename: &str) -> Result<Reply> {
        let nc = ElementMaker::netconf();
        let body = nc.node("rollback", [nc.leaf("file", filename)]);
        self.call(&body.to_xml()?).await
    }

    pub async fn cli_display(&mut self, commands: &[String]) -> Result<Reply> {
        self.cli("Execution", commands).await
    }

    pub async fn cli_config(&mut self, commands: &[String]) -> Result<Reply> {
        self.cli("Configuration", commands).await
    }

    pub async fn reboot(&mut self) -> Result<()> {
        match self.cli_display(&["reboot force".to_string()]).await {
            Ok(_) => Ok(()),
            Err(e) if is_expected_disconnect(&e) => {
                info!("Session dropped after reboot: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn cli(&mut self, section: &str, commands: &[String]) -> Result<Reply> {
        let nc = ElementMaker::netconf();
        let body = nc.node("CLI", [nc.leaf(section, commands.join("\n"))]);
        self.call(&body.to_xml()?).await
    }

    async fn call(&mut self, body: &str) -> Result<Reply> {
        debug!("rpc: {}", body);
        let raw = self.handle.rpc(body).await?;
        let reply = Element::parse(&raw)?;
        check_rpc_error(&reply)?;
        Ok(Reply::Xml(reply))
    }
}

/// Turn an `<rpc-error>` in a reply into an error.
fn check_rpc_error(reply: &Element) -> std::result::Result<(), ConnectionError> {
    let is_error = |e: &Element| e.is(NETCONFBASE, "rpc-error");
    let error = if is_error(reply) {
        Some(reply)
    } else {
        reply.find(NETCONFBASE, "rpc-error")
    };

    match error {
        None => Ok(()),
        Some(error) => {
            let tag = error.find_text(NETCONFBASE, "error-tag").unwrap_or("unknown");
            let message = error
                .find_text(NETCONFBASE, "error-message")
                .unwrap_or_default()
                .trim();
            warn!("rpc-error {}: {}", tag, message);
            Err(ConnectionError::Rpc {
                tag: tag.to_string(),
                message: message.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::connection::mock::{Call, MockSession, calls};
    use crate::error::Error;

    fn rpc_bodies(log: &crate::connection::mock::CallLog) -> Vec<String> {
        calls(log)
            .into_iter()
            .filter_map(|call| match call {
                Call::Rpc(body) => Some(body),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cli_envelopes() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut conn = NetconfConnection::new(session);

        conn.cli_display(&["display vlan".to_string(), "display clock".to_string()])
            .await
            .unwrap();
        conn.cli_config(&["vlan 10 & 20".to_string()]).await.unwrap();

        assert_eq!(
            rpc_bodies(&log),
            vec![
                r#"<CLI xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><Execution>display vlan
display clock</Execution></CLI>"#
                    .to_string(),
                r#"<CLI xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><Configuration>vlan 10 &amp; 20</Configuration></CLI>"#
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_edit_config_targets_datastore() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut conn = NetconfConnection::new(session);

        conn.edit_config("<config/>", Datastore::Running).await.unwrap();
        assert_eq!(
            rpc_bodies(&log),
            vec!["<edit-config><target><running/></target><config/></edit-config>".to_string()]
        );
    }

    #[tokio::test]
    async fn test_save_and_rollback_bodies() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut conn = NetconfConnection::new(session);

        conn.save(None).await.unwrap();
        conn.save(Some("flash:/startup.cfg")).await.unwrap();
        conn.rollback("flash:/backup.cfg").await.unwrap();
        conn.action("<top/>").await.unwrap();

        let bodies = rpc_bodies(&log);
        assert_eq!(bodies[0], r#"<save xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"/>"#);
        assert!(bodies[1].ends_with("<file>flash:/startup.cfg</file></save>"));
        assert!(bodies[2].ends_with("<rollback xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\"><file>flash:/backup.cfg</file></rollback>"));
        assert_eq!(bodies[3], "<action><top/></action>");
    }

    #[tokio::test]
    async fn test_get_wraps_subtree_filter() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut conn = NetconfConnection::new(session);

        let d = ElementMaker::data();
        conn.get(&GetQuery::Subtree(d.node("top", [d.empty("VLAN")])))
            .await
            .unwrap();
        assert_eq!(
            rpc_bodies(&log)[0],
            r#"<get xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><filter type="subtree"><top xmlns="http://www.h3c.com/netconf/data:1.0"><VLAN/></top></filter></get>"#
        );
    }

    #[tokio::test]
    async fn test_rpc_error_surfaces() {
        let session = MockSession::netconf().reply(
            r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <rpc-error>
    <error-type>application</error-type>
    <error-tag>data-missing</error-tag>
    <error-message xml:lang="en"> VLAN 4000 does not exist. </error-message>
  </rpc-error>
</rpc-reply>"#,
        );
        let mut conn = NetconfConnection::new(session);

        match conn.rollback("flash:/x.cfg").await {
            Err(Error::Connection(ConnectionError::Rpc { tag, message })) => {
                assert_eq!(tag, "data-missing");
                assert_eq!(message, "VLAN 4000 does not exist.");
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reboot_swallows_timeout_only() {
        let session = MockSession::netconf().fail(ConnectionError::Timeout(Duration::from_secs(30)));
        let log = session.log();
        let mut conn = NetconfConnection::new(session);
        conn.reboot().await.unwrap();
        assert!(rpc_bodies(&log)[0].contains("<Execution>reboot force</Execution>"));

        let session = MockSession::netconf().fail(ConnectionError::Rpc {
            tag: "operation-failed".to_string(),
            message: "busy".to_string(),
        });
        let mut conn = NetconfConnection::new(session);
        assert!(conn.reboot().await.is_err());
    }
}
