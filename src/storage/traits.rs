use anyhow::Result;

/// Recyclable-material category offered as a selectable tag.
/// Seeded once at schema creation, immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub image: String,
}

/// A registered collection point as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub id: i64,
    pub image: String,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub uf: String,
}

/// A collection point candidate, identical to [`Point`] minus the
/// generated id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPoint {
    pub image: String,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub uf: String,
}

pub trait StorageRead {
    fn load_point(&self, id: i64) -> Result<Option<Point>>;

    /// Distinct points in `city`/`uf` associated with at least one of
    /// `item_ids`. An empty id set matches nothing.
    fn list_points(&self, city: &str, uf: &str, item_ids: &[i64]) -> Result<Vec<Point>>;

    fn list_items(&self) -> Result<Vec<Item>>;

    /// Titles of the items associated with a point, in catalog order.
    fn list_point_item_titles(&self, point_id: i64) -> Result<Vec<String>>;
}

pub trait StorageWrite {
    /// Inserts the point row and returns its generated id.
    fn insert_point(&self, point: &NewPoint) -> Result<i64>;

    fn insert_point_item(&self, point_id: i64, item_id: i64) -> Result<()>;
}

/// A transaction handle. Dropping it without calling `commit` rolls back
/// every write issued through it.
pub trait StorageTx: StorageRead + StorageWrite {
    fn commit(self) -> Result<()>;
}

pub trait Storage: StorageRead {
    type Tx: StorageTx;

    fn begin_tx(&self) -> Result<Self::Tx>;
}
