pub mod benchmark;
pub mod flavor;
pub mod report;
pub mod result;
pub mod site;
pub mod user;

pub use benchmark::{Entity as Benchmark, Model as BenchmarkModel};
pub use flavor::{Entity as Flavor, Model as FlavorModel};
pub use report::{Entity as Report, Model as ReportModel, Resolution, ResourceType};
pub use result::{Entity as BenchResult, Model as BenchResultModel};
pub use site::{Entity as Site, Model as SiteModel};
pub use user::{Entity as User, Model as UserModel};
