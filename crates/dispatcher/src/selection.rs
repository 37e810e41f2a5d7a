use allocator_core::models::{Agent, CapacityCeiling};

/// 按目录返回的顺序选出第一个负载低于上限的坐席
pub fn select_first_fit(agents: &[Agent], ceiling: CapacityCeiling) -> Option<&Agent> {
    agents
        .iter()
        .find(|agent| ceiling.admits(agent.current_customer_count))
}
