pub mod asian_geometric;
pub mod bs_analytic;
