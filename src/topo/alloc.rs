//! GUID / LID 分配

use crate::error::{FtreeError, Result};
use crate::subnet::{Guid, Lid, Subnet};

const SWITCH_GUID_BASE: u64 = 0x0002_c902_0000_0000;
const CA_GUID_BASE: u64 = 0x0002_c903_0000_0000;
/// 单播 LID 上限
const MAX_UNICAST_LID: u16 = 0xBFFF;
/// CA 节点 GUID 间隔，端口 GUID 为节点 GUID + 端口号
const CA_GUID_STRIDE: u64 = 0x10;

/// 按创建顺序分配 GUID 与 LID（LID 从 1 开始）
#[derive(Debug, Default)]
pub(crate) struct Allocator {
    switches: u64,
    cas: u64,
    next_lid: u16,
}

impl Allocator {
    fn lid(&mut self) -> Result<Lid> {
        let next = self
            .next_lid
            .checked_add(1)
            .filter(|&lid| lid <= MAX_UNICAST_LID)
            .ok_or_else(|| {
                FtreeError::GeneratorOptions(format!(
                    "fabric needs more than {MAX_UNICAST_LID:#06x} unicast LIDs"
                ))
            })?;
        self.next_lid = next;
        Ok(Lid(next))
    }

    pub fn switch(
        &mut self,
        subnet: &mut Subnet,
        num_ports: u8,
        description: String,
    ) -> Result<Guid> {
        let lid = self.lid()?;
        self.switches += 1;
        let guid = Guid(SWITCH_GUID_BASE + self.switches);
        Ok(subnet.add_switch(guid, lid, num_ports, description))
    }

    /// 创建 CA 并为端口 1..=ports 分配 LID
    pub fn ca(&mut self, subnet: &mut Subnet, ports: u8, description: String) -> Result<Guid> {
        self.cas += 1;
        let guid = Guid(CA_GUID_BASE + self.cas * CA_GUID_STRIDE);
        subnet.add_ca(guid, ports, description);
        for port in 1..=ports {
            let lid = self.lid()?;
            subnet.add_ca_port(guid, port, Guid(guid.0 + port as u64), lid)?;
        }
        Ok(guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lids_are_sequential_from_one() {
        let mut subnet = Subnet::new();
        let mut alloc = Allocator::default();
        let sw = alloc.switch(&mut subnet, 4, "s".to_string()).expect("switch");
        let ca = alloc.ca(&mut subnet, 2, "c".to_string()).expect("ca");
        assert_eq!(subnet.node(sw).map(|n| n.base_lid), Some(Lid(1)));
        let ports: Vec<Lid> = (1..=2)
            .filter_map(|p| subnet.node(ca)?.port(p).map(|p| p.base_lid))
            .collect();
        assert_eq!(ports, vec![Lid(2), Lid(3)]);
    }

    #[test]
    fn running_out_of_lids_is_an_error() {
        let mut subnet = Subnet::new();
        let mut alloc = Allocator {
            next_lid: MAX_UNICAST_LID - 1,
            ..Allocator::default()
        };
        alloc.switch(&mut subnet, 4, "last".to_string()).expect("last lid");
        let err = alloc
            .switch(&mut subnet, 4, "one too many".to_string())
            .expect_err("lid space exhausted");
        assert!(matches!(err, FtreeError::GeneratorOptions(_)));
        assert_eq!(subnet.switch_count(), 1);

        let err = alloc
            .ca(&mut subnet, 1, "host".to_string())
            .expect_err("no lid for ca port");
        assert!(matches!(err, FtreeError::GeneratorOptions(_)));
    }
}
