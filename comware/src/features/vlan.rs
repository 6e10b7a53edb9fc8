//! VLAN configuration over NETCONF.

use log::debug;

use super::{Submission, reply_root};
use crate::connection::{Datastore, GetQuery, SessionHandle};
use crate::device::Device;
use crate::error::Result;
use crate::xml::{
    EditOperation, Element, ElementMaker, KeyMap, ParamMap, data_element_to_dict,
    find_all_in_data, operation_attribute, params_to_elements,
};

/// Desired state of a VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanState {
    Present,
    Absent,
}

impl VlanState {
    fn operation(self) -> EditOperation {
        match self {
            VlanState::Present => EditOperation::Merge,
            VlanState::Absent => EditOperation::Delete,
        }
    }
}

/// One VLAN on the switch.
#[derive(Debug, Clone)]
pub struct Vlan {
    vlanid: String,
    key_map: KeyMap,
}

impl Vlan {
    pub fn new(vlanid: impl Into<String>) -> Self {
        let key_map = [("vlanid", "ID"), ("name", "Name"), ("descr", "Description")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            vlanid: vlanid.into(),
            key_map,
        }
    }

    pub fn vlanid(&self) -> &str {
        &self.vlanid
    }

    /// Subtree filter selecting VLAN entries.
    fn query() -> Element {
        let e = ElementMaker::data();
        e.node("top", [e.node("VLAN", [e.node("VLANs", [e.empty("VLANID")])])])
    }

    /// IDs of every VLAN on the switch.
    pub async fn get_vlan_list<H: SessionHandle>(device: &mut Device<H>) -> Result<Vec<String>> {
        let reply = device.get(Some(&GetQuery::Subtree(Self::query()))).await?;
        Ok(reply_root(&reply)
            .map(|root| {
                find_all_in_data("ID", root)
                    .into_iter()
                    .map(|id| id.text().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Current `vlanid`, `name` and `descr`; empty if the VLAN does not exist.
    pub async fn get_config<H: SessionHandle>(&self, device: &mut Device<H>) -> Result<ParamMap> {
        let e = ElementMaker::data();
        let mut query = Self::query();
        if let Some(entry) = query.find_mut(e.namespace(), "VLANID") {
            entry.push(e.leaf("ID", self.vlanid.as_str()));
        }

        let reply = device.get(Some(&GetQuery::Subtree(query))).await?;
        Ok(reply_root(&reply)
            .map(|root| data_element_to_dict(root, &self.key_map, None))
            .unwrap_or_default())
    }

    /// `edit-config` body for this VLAN.
    ///
    /// `params` may carry `name` and `descr`; the VLAN ID always comes first.
    pub fn config(&self, state: VlanState, params: &ParamMap) -> Element {
        let mut fields = ParamMap::new();
        fields.insert("vlanid".to_string(), self.vlanid.clone());
        for (key, value) in params {
            if key != "vlanid" {
                fields.insert(key.clone(), value.clone());
            }
        }

        let c = ElementMaker::config();
        let leaves = params_to_elements(&fields, &self.key_map, None, c, true);
        ElementMaker::netconf().node(
            "config",
            [c.node(
                "top",
                [c.node("VLAN", [c.node("VLANs", [c.node("VLANID", leaves)])])
                    .with_attributes(operation_attribute(Some(state.operation())))],
            )],
        )
    }

    /// Create or update the VLAN.
    pub async fn build<H: SessionHandle>(
        &self,
        device: &mut Device<H>,
        params: &ParamMap,
        stage: bool,
    ) -> Result<Submission> {
        self.submit(device, self.config(VlanState::Present, params), stage)
            .await
    }

    /// Delete the VLAN.
    pub async fn remove<H: SessionHandle>(&self, device: &mut Device<H>, stage: bool) -> Result<Submission> {
        self.submit(device, self.config(VlanState::Absent, &ParamMap::new()), stage)
            .await
    }

    async fn submit<H: SessionHandle>(
        &self,
        device: &mut Device<H>,
        config: Element,
        stage: bool,
    ) -> Result<Submission> {
        if stage {
            debug!("Staging VLAN {} edit", self.vlanid);
            device.stage_config(config, "edit_config")?;
            Ok(Submission::Staged)
        } else {
            let reply = device.edit_config(&config, Datastore::Running).await?;
            Ok(Submission::Sent(reply))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::{Call, MockSession, calls};
    use crate::device::StagedText;

    const VLAN_REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="1">
  <data>
    <top xmlns="http://www.h3c.com/netconf/data:1.0">
      <VLAN><VLANs>
        <VLANID><ID>1</ID><Name>default</Name><Description>VLAN 0001</Description></VLANID>
        <VLANID><ID>10</ID><Name>web</Name></VLANID>
      </VLANs></VLAN>
    </top>
  </data>
</rpc-reply>"#;

    fn params(pairs: &[(&str, &str)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_merges_with_id_first() {
        let vlan = Vlan::new("10");
        let xml = vlan
            .config(VlanState::Present, &params(&[("name", "web"), ("descr", "frontend")]))
            .to_xml()
            .unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">"#,
                r#"<top xmlns="http://www.h3c.com/netconf/config:1.0">"#,
                r#"<VLAN xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0" nc:operation="merge">"#,
                r#"<VLANs><VLANID><ID>10</ID><Name>web</Name><Description>frontend</Description></VLANID></VLANs>"#,
                r#"</VLAN></top></config>"#
            )
        );
    }

    #[test]
    fn test_remove_uses_delete() {
        let xml = Vlan::new("20").config(VlanState::Absent, &ParamMap::new()).to_xml().unwrap();
        assert!(xml.contains(r#"nc:operation="delete""#));
        assert!(xml.contains("<VLANID><ID>20</ID></VLANID>"));
    }

    #[tokio::test]
    async fn test_get_vlan_list() {
        let mut device = Device::open(MockSession::netconf().reply(VLAN_REPLY)).await.unwrap();
        assert_eq!(Vlan::get_vlan_list(&mut device).await.unwrap(), vec!["1", "10"]);
    }

    #[tokio::test]
    async fn test_get_config_filters_by_id() {
        let session = MockSession::netconf().reply(VLAN_REPLY);
        let log = session.log();
        let mut device = Device::open(session).await.unwrap();

        let config = Vlan::new("1").get_config(&mut device).await.unwrap();
        assert_eq!(
            config,
            params(&[("vlanid", "1"), ("name", "default"), ("descr", "VLAN 0001")])
        );
        match &calls(&log)[1] {
            Call::Rpc(body) => assert!(body.contains("<VLANID><ID>1</ID></VLANID>")),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_build_stages_edit_config() {
        let mut device = Device::new(MockSession::netconf());
        let vlan = Vlan::new("30");

        let submitted = vlan.build(&mut device, &params(&[("name", "db")]), true).await.unwrap();
        assert_eq!(submitted, Submission::Staged);
        vlan.remove(&mut device, true).await.unwrap();

        let shown = device.staged_to_string().unwrap();
        assert_eq!(shown.len(), 2);
        assert!(matches!(&shown[0], StagedText::Text(xml) if xml.contains("<Name>db</Name>")));
    }

    #[tokio::test]
    async fn test_build_sends_immediately() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut device = Device::open(session).await.unwrap();

        let submitted = Vlan::new("30").build(&mut device, &ParamMap::new(), false).await.unwrap();
        assert!(matches!(submitted, Submission::Sent(_)));
        assert!(device.staged().is_empty());
        assert!(matches!(&calls(&log)[1], Call::Rpc(body) if body.starts_with("<edit-config>")));
    }
}
