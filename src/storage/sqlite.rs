use anyhow::Result;
use rusqlite::{params, types::Value, Connection, OptionalExtension};
use std::path::Path;

use super::traits::{Item, NewPoint, Point, Storage, StorageRead, StorageTx, StorageWrite};

const DB_SCHEMA_VERSION: i64 = 1;

/// Reference catalog inserted when the schema is first created. The image
/// column holds the asset filename served from the uploads base URL.
const ITEM_CATALOG: &[(&str, &str)] = &[
    ("Lâmpadas", "lampadas.svg"),
    ("Pilhas e Baterias", "baterias.svg"),
    ("Papéis e Papelão", "papeis-papelao.svg"),
    ("Resíduos Eletrônicos", "eletronicos.svg"),
    ("Resíduos Orgânicos", "organicos.svg"),
    ("Óleo de Cozinha", "oleo.svg"),
];

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

impl StorageTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

fn map_point_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Point> {
    Ok(Point {
        id: row.get(0)?,
        image: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        whatsapp: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        city: row.get(7)?,
        uf: row.get(8)?,
    })
}

fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        image: row.get(2)?,
    })
}

fn db_load_point(conn: &Connection, id: i64) -> rusqlite::Result<Option<Point>> {
    conn.query_row(
        "SELECT id, image, name, email, whatsapp, latitude, longitude, city, uf
         FROM points WHERE id = ?1",
        params![id],
        map_point_row,
    )
    .optional()
}

fn db_list_points(
    conn: &Connection,
    city: &str,
    uf: &str,
    item_ids: &[i64],
) -> rusqlite::Result<Vec<Point>> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = std::iter::repeat("?")
        .take(item_ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        r#"
        SELECT DISTINCT points.id, points.image, points.name, points.email, points.whatsapp,
               points.latitude, points.longitude, points.city, points.uf
        FROM points
        JOIN point_items ON point_items.point_id = points.id
        WHERE points.city = ?
          AND points.uf = ?
          AND point_items.item_id IN ({placeholders})
        ORDER BY points.id
        "#
    );

    let mut values: Vec<Value> = Vec::with_capacity(2 + item_ids.len());
    values.push(Value::from(city.to_string()));
    values.push(Value::from(uf.to_string()));
    values.extend(item_ids.iter().map(|id| Value::from(*id)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), map_point_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_items(conn: &Connection) -> rusqlite::Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, title, image FROM items ORDER BY id")?;
    let rows = stmt
        .query_map([], map_item_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_point_item_titles(conn: &Connection, point_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT items.title
        FROM items
        JOIN point_items ON point_items.item_id = items.id
        WHERE point_items.point_id = ?1
        ORDER BY items.id
        "#,
    )?;
    let rows = stmt
        .query_map(params![point_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_point(conn: &Connection, point: &NewPoint) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO points (image, name, email, whatsapp, latitude, longitude, city, uf)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            point.image,
            point.name,
            point.email,
            point.whatsapp,
            point.latitude,
            point.longitude,
            point.city,
            point.uf
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_insert_point_item(conn: &Connection, point_id: i64, item_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO point_items (point_id, item_id) VALUES (?1, ?2)",
        params![point_id, item_id],
    )?;
    Ok(())
}

impl StorageRead for SqliteTx {
    fn load_point(&self, id: i64) -> Result<Option<Point>> {
        Ok(db_load_point(&self.conn, id)?)
    }

    fn list_points(&self, city: &str, uf: &str, item_ids: &[i64]) -> Result<Vec<Point>> {
        Ok(db_list_points(&self.conn, city, uf, item_ids)?)
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        Ok(db_list_items(&self.conn)?)
    }

    fn list_point_item_titles(&self, point_id: i64) -> Result<Vec<String>> {
        Ok(db_list_point_item_titles(&self.conn, point_id)?)
    }
}

impl StorageWrite for SqliteTx {
    fn insert_point(&self, point: &NewPoint) -> Result<i64> {
        Ok(db_insert_point(&self.conn, point)?)
    }

    fn insert_point_item(&self, point_id: i64, item_id: i64) -> Result<()> {
        Ok(db_insert_point_item(&self.conn, point_id, item_id)?)
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = self.open_conn()?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn open_conn(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        Ok(conn)
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.open_conn()?;
        Self::migrate(&conn)?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                image TEXT NOT NULL
            );
            CREATE TABLE points (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                whatsapp TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                city TEXT NOT NULL,
                uf TEXT NOT NULL
            );
            CREATE TABLE point_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                point_id INTEGER NOT NULL REFERENCES points(id),
                item_id INTEGER NOT NULL REFERENCES items(id)
            );
            CREATE INDEX point_items_point_idx ON point_items(point_id);
            CREATE INDEX point_items_item_idx ON point_items(item_id);
            CREATE INDEX points_city_uf_idx ON points(city, uf);
        "#,
            )?;
            for (title, image) in ITEM_CATALOG {
                conn.execute(
                    "INSERT INTO items (title, image) VALUES (?1, ?2)",
                    params![title, image],
                )?;
            }
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

impl StorageRead for SqliteStorage {
    fn load_point(&self, id: i64) -> Result<Option<Point>> {
        let row = self.with_conn(|conn| db_load_point(conn, id))?;
        Ok(row)
    }

    fn list_points(&self, city: &str, uf: &str, item_ids: &[i64]) -> Result<Vec<Point>> {
        let rows = self.with_conn(|conn| db_list_points(conn, city, uf, item_ids))?;
        Ok(rows)
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let rows = self.with_conn(db_list_items)?;
        Ok(rows)
    }

    fn list_point_item_titles(&self, point_id: i64) -> Result<Vec<String>> {
        let rows = self.with_conn(|conn| db_list_point_item_titles(conn, point_id))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{Connection, OptionalExtension};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_file(prefix: &str, ext: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("{}_{}.{}", prefix, nanos, ext));
        p
    }

    fn sample_point() -> NewPoint {
        NewPoint {
            image: "mercado.jpg".to_string(),
            name: "Mercado do Bairro".to_string(),
            email: "contato@mercado.com".to_string(),
            whatsapp: "11999999999".to_string(),
            latitude: -23.55,
            longitude: -46.63,
            city: "São Paulo".to_string(),
            uf: "SP".to_string(),
        }
    }

    #[test]
    fn sqlite_reset_all_ok_when_missing() {
        let path = unique_temp_file("ecoleta_reset", "db");
        let repo = SqliteStorage::new(&path);
        repo.reset_all().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn sqlite_reset_all_removes_existing_file() {
        let path = unique_temp_file("ecoleta_reset", "db");
        std::fs::write(&path, b"dummy").unwrap();
        assert!(path.exists());
        let repo = SqliteStorage::new(&path);
        repo.reset_all().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn sqlite_init_initializes_schema_and_seeds_catalog() {
        let path = unique_temp_file("ecoleta_init", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        assert!(path.exists());

        let conn = Connection::open(&path).unwrap();
        let points_table = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='points'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .unwrap();
        assert_eq!(points_table.as_deref(), Some("points"));

        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, DB_SCHEMA_VERSION);

        let items = repo.list_items().unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].title, "Lâmpadas");
        assert_eq!(items[0].image, "lampadas.svg");
        assert_eq!(items[5].title, "Óleo de Cozinha");
    }

    #[test]
    fn sqlite_init_is_idempotent() {
        let path = unique_temp_file("ecoleta_init_twice", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();
        repo.init().unwrap();

        let items = repo.list_items().unwrap();
        assert_eq!(items.len(), 6);
    }

    #[test]
    fn sqlite_fails_on_mismatched_schema_version() {
        let path = unique_temp_file("ecoleta_bad_version", "db");
        let repo = SqliteStorage::new(&path);

        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 999;").unwrap();

        let err = repo
            .init()
            .expect_err("init should fail on version mismatch");
        let msg = format!("{err}");
        assert!(msg.contains("database schema version mismatch"));
        assert!(msg.contains("--reset"));
    }

    #[test]
    fn sqlite_insert_point_with_items_roundtrip() {
        let path = unique_temp_file("ecoleta_roundtrip", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        let tx = repo.begin_tx().unwrap();
        let id = tx.insert_point(&sample_point()).unwrap();
        tx.insert_point_item(id, 1).unwrap();
        tx.insert_point_item(id, 3).unwrap();
        tx.commit().unwrap();

        let loaded = repo.load_point(id).unwrap().unwrap();
        assert_eq!(loaded.name, "Mercado do Bairro");
        assert_eq!(loaded.whatsapp, "11999999999");
        assert_eq!(loaded.latitude, -23.55);
        assert_eq!(loaded.uf, "SP");

        let titles = repo.list_point_item_titles(id).unwrap();
        assert_eq!(titles, vec!["Lâmpadas", "Papéis e Papelão"]);
    }

    #[test]
    fn sqlite_load_point_returns_none_for_unknown_id() {
        let path = unique_temp_file("ecoleta_missing", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        assert!(repo.load_point(42).unwrap().is_none());
    }

    #[test]
    fn sqlite_dropped_tx_rolls_back() {
        let path = unique_temp_file("ecoleta_rollback", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        {
            let tx = repo.begin_tx().unwrap();
            let id = tx.insert_point(&sample_point()).unwrap();
            tx.insert_point_item(id, 1).unwrap();
            // dropped without commit
        }

        let conn = Connection::open(&path).unwrap();
        let points: i64 = conn
            .query_row("SELECT COUNT(*) FROM points", [], |row| row.get(0))
            .unwrap();
        let associations: i64 = conn
            .query_row("SELECT COUNT(*) FROM point_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(points, 0);
        assert_eq!(associations, 0);
    }

    #[test]
    fn sqlite_rejects_association_to_unknown_item() {
        let path = unique_temp_file("ecoleta_fk", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        let tx = repo.begin_tx().unwrap();
        let id = tx.insert_point(&sample_point()).unwrap();
        let err = tx.insert_point_item(id, 999).unwrap_err();
        assert!(format!("{err}").to_lowercase().contains("foreign key"));
    }

    #[test]
    fn sqlite_list_points_filters_by_city_uf_and_items() {
        let path = unique_temp_file("ecoleta_list", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        let tx = repo.begin_tx().unwrap();
        let in_town = tx.insert_point(&sample_point()).unwrap();
        tx.insert_point_item(in_town, 1).unwrap();
        tx.insert_point_item(in_town, 2).unwrap();

        let mut elsewhere = sample_point();
        elsewhere.city = "Campinas".to_string();
        let elsewhere_id = tx.insert_point(&elsewhere).unwrap();
        tx.insert_point_item(elsewhere_id, 1).unwrap();

        let mut other_items = sample_point();
        other_items.name = "Cooperativa".to_string();
        let other_items_id = tx.insert_point(&other_items).unwrap();
        tx.insert_point_item(other_items_id, 6).unwrap();
        tx.commit().unwrap();

        // A point matching two requested items still shows up once.
        let points = repo.list_points("São Paulo", "SP", &[1, 2]).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, in_town);

        let points = repo.list_points("Campinas", "SP", &[1, 2]).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, elsewhere_id);

        let points = repo.list_points("São Paulo", "SP", &[6]).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "Cooperativa");

        let points = repo.list_points("São Paulo", "RJ", &[1, 2, 6]).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn sqlite_list_points_empty_item_set_matches_nothing() {
        let path = unique_temp_file("ecoleta_list_empty", "db");
        let repo = SqliteStorage::new(&path);
        repo.init().unwrap();

        let tx = repo.begin_tx().unwrap();
        let id = tx.insert_point(&sample_point()).unwrap();
        tx.insert_point_item(id, 1).unwrap();
        tx.commit().unwrap();

        let points = repo.list_points("São Paulo", "SP", &[]).unwrap();
        assert!(points.is_empty());
    }
}
