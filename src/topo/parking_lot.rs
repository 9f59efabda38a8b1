//! Parking-lot 拓扑构建
//!
//! ```text
//!           h2      h4       h6
//!           |       |        |
//!   h1 ---- S1 ---- S2 ----- S3 ---- h8
//!           |       |        |
//!           h3      h5       h7
//! ```
//!
//! 三台交换机串成 S1–S2–S3，两条交换机间链路是瓶颈；`n` 台主机挂在 S1，
//! `n - 1` 台挂在 S2，`n` 台挂在 S3，共 `3n - 1` 台。

use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::error::ExperimentError;
use crate::net::{LinkId, NodeId, Topology};
use crate::shaping::ShapingDescriptor;

/// 10.0.0.0/8 中可用的主机地址数
const MAX_HOSTS: i64 = (1 << 24) - 2;

/// Parking-lot 拓扑配置选项
#[derive(Debug, Clone)]
pub struct ParkingLotOpts {
    /// 挂在 S1（以及 S3）上的主机数
    pub n: i64,
    /// [S1–S2, S2–S3] 的整形
    pub bottlenecks: [ShapingDescriptor; 2],
}

/// 构建结果：拓扑与各角色节点的索引。
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingLot {
    pub n: usize,
    pub topology: Topology,
    pub switches: [NodeId; 3],
    /// 按编号排列：`hosts[0]` 是 h1
    pub hosts: Vec<NodeId>,
    pub bottlenecks: [LinkId; 2],
}

impl ParkingLot {
    /// 1-based 主机编号（`host(1)` 即 h1）
    pub fn host(&self, k: usize) -> Option<NodeId> {
        k.checked_sub(1).and_then(|i| self.hosts.get(i).copied())
    }

    /// 主机下标 `h`（0-based）挂接的交换机序号 0..3
    pub fn switch_index_of(n: usize, h: usize) -> usize {
        if h < n {
            0
        } else if h < 2 * n - 1 {
            1
        } else {
            2
        }
    }
}

/// 主机 hk 的地址：10.0.0.k，越过 255 时进位到更高的字节。
pub fn host_ip(k: usize) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 0, 0, 0)).saturating_add(k as u32))
}

/// 构建 parking-lot 拓扑。纯函数：相同输入得到结构与 id 完全相同的拓扑。
#[tracing::instrument(skip(opts), fields(n = opts.n))]
pub fn build_parking_lot(opts: &ParkingLotOpts) -> Result<ParkingLot, ExperimentError> {
    if opts.n < 1 {
        return Err(ExperimentError::config(format!(
            "parking-lot needs n >= 1, got {}",
            opts.n
        )));
    }
    if opts.n.saturating_mul(3) - 1 > MAX_HOSTS {
        return Err(ExperimentError::config(format!(
            "n = {} does not fit the 10.0.0.0/8 host address range",
            opts.n
        )));
    }
    let n = opts.n as usize;

    let mut topo = Topology::default();
    let s1 = topo.add_switch("s1");
    let s2 = topo.add_switch("s2");
    let s3 = topo.add_switch("s3");

    let [b12, b23] = opts.bottlenecks.clone();
    let l12 = topo.connect(s1, s2, Some(b12))?;
    let l23 = topo.connect(s2, s3, Some(b23))?;

    let switches = [s1, s2, s3];
    let host_count = 3 * n - 1;
    let mut hosts = Vec::with_capacity(host_count);
    for h in 0..host_count {
        let id = topo.add_host(format!("h{}", h + 1), host_ip(h + 1));
        let sw = switches[ParkingLot::switch_index_of(n, h)];
        topo.connect(id, sw, None)?;
        hosts.push(id);
    }
    debug!(hosts = host_count, links = topo.links().len(), "拓扑节点与链路已创建");
    info!("🅿️  parking-lot 拓扑构建完成");

    Ok(ParkingLot {
        n,
        topology: topo,
        switches,
        hosts,
        bottlenecks: [l12, l23],
    })
}
