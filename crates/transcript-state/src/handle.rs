//! SurrealDB Handle - Connection and Operations
//!
//! Manages connection and provides methods for:
//! - save_record / load_record / delete_record
//! - save_profile / load_profile
//!
//! Supports both local (in-memory) and cloud (WebSocket) connections.
//! Records are stored whole, as one JSON document per owner, so every upsert
//! replaces the previous document in a single statement.

use crate::error::StorageError;
use crate::schema::{normalize_registration, AcademicRecord};
use crate::storage_traits::StorageResult;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

const DEFAULT_NAMESPACE: &str = "transcript";
const DEFAULT_DATABASE: &str = "main";

/// Configuration for SurrealDB Cloud connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "transcript")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "transcript")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_ROOT (optional, default: "false")
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("SURREALDB_ENDPOINT").map_err(|_| "SURREALDB_ENDPOINT not set")?;
        let username =
            std::env::var("SURREALDB_USERNAME").map_err(|_| "SURREALDB_USERNAME not set")?;
        let password =
            std::env::var("SURREALDB_PASSWORD").map_err(|_| "SURREALDB_PASSWORD not set")?;
        let namespace = std::env::var("SURREALDB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// SurrealDB connection handle
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbRecord {
    owner_id: String,
    registration_number: String,
    document: String,
    updated_at: SurrealDatetime,
}

impl DbRecord {
    fn from_record(record: &AcademicRecord) -> StorageResult<Self> {
        Ok(DbRecord {
            owner_id: record.owner_id.clone(),
            registration_number: record.registration_number.clone(),
            document: serde_json::to_string(record)?,
            updated_at: SurrealDatetime::from(record.last_updated),
        })
    }

    fn into_record(self) -> StorageResult<AcademicRecord> {
        Ok(serde_json::from_str(&self.document)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbProfile {
    owner_id: String,
    registration_number: String,
}

impl SurrealHandle {
    /// Connect to SurrealDB in-memory and set up schema
    #[instrument(skip_all)]
    pub async fn setup_db() -> StorageResult<Self> {
        info!("Connecting to SurrealDB (in-memory)");

        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        db.use_ns(DEFAULT_NAMESPACE)
            .use_db(DEFAULT_DATABASE)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let handle = SurrealHandle { db };
        handle.init_schema().await?;

        info!("SurrealDB connected and schema initialized");
        Ok(handle)
    }

    /// Connect to SurrealDB Cloud
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn setup_cloud(config: CloudConfig) -> StorageResult<Self> {
        info!("Connecting to SurrealDB Cloud (root={})", config.is_root);

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StorageError::Connection(format!(
                    "Failed to connect to {}: {}",
                    config.endpoint, e
                ))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StorageError::Connection(format!("Root authentication failed: {}", e)))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Database authentication failed: {}", e))
            })?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        let handle = SurrealHandle { db };
        handle.init_schema().await?;

        info!("SurrealDB Cloud connected and schema initialized");
        Ok(handle)
    }

    /// Connect using environment variables
    ///
    /// If SURREALDB_ENDPOINT is set, connects to cloud.
    /// If SURREALDB_URL is set, connects to that URL.
    /// Otherwise, falls back to in-memory.
    #[instrument(skip_all)]
    pub async fn setup_from_env() -> StorageResult<Self> {
        if let Ok(config) = CloudConfig::from_env() {
            info!("Cloud config found, connecting to SurrealDB Cloud");
            return Self::setup_cloud(config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            info!("SURREALDB_URL found, connecting to {}", url);
            let db = surrealdb::engine::any::connect(&url)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

            db.use_ns(DEFAULT_NAMESPACE)
                .use_db(DEFAULT_DATABASE)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

            let handle = SurrealHandle { db };
            handle.init_schema().await?;
            return Ok(handle);
        }

        info!("No cloud config found, using in-memory database");
        Self::setup_db().await
    }

    /// Initialize the database schema
    async fn init_schema(&self) -> StorageResult<()> {
        debug!("Initializing transcript schema");

        let schema = r#"
            -- Academic records (one JSON document per owner)
            DEFINE TABLE academic_records SCHEMAFULL;
            DEFINE FIELD owner_id ON academic_records TYPE string;
            DEFINE FIELD registration_number ON academic_records TYPE string;
            DEFINE FIELD document ON academic_records TYPE string;
            DEFINE FIELD updated_at ON academic_records TYPE datetime;
            DEFINE INDEX idx_record_owner ON academic_records FIELDS owner_id UNIQUE;
            DEFINE INDEX idx_record_registration ON academic_records FIELDS registration_number;

            -- Student profiles (registration number on file per owner)
            DEFINE TABLE student_profiles SCHEMAFULL;
            DEFINE FIELD owner_id ON student_profiles TYPE string;
            DEFINE FIELD registration_number ON student_profiles TYPE string;
            DEFINE INDEX idx_profile_owner ON student_profiles FIELDS owner_id UNIQUE;
        "#;

        self.db
            .query(schema)
            .await
            .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;

        debug!("Schema initialized successfully");
        Ok(())
    }

    // ========== Record Operations ==========

    async fn find_record_row(&self, owner_id: &str) -> StorageResult<Option<DbRecord>> {
        let owner_owned = owner_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM academic_records WHERE owner_id = $owner")
            .bind(("owner", owner_owned))
            .await?;

        let rows: Vec<DbRecord> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Load the record for an owner
    #[instrument(skip(self))]
    pub async fn load_record(&self, owner_id: &str) -> StorageResult<Option<AcademicRecord>> {
        debug!("Loading academic record");

        match self.find_record_row(owner_id).await? {
            Some(row) => Ok(Some(row.into_record()?)),
            None => Ok(None),
        }
    }

    /// Create or replace the record for `record.owner_id`
    #[instrument(skip(self, record), fields(owner_id = %record.owner_id, terms = record.terms.len()))]
    pub async fn save_record(&self, record: &AcademicRecord) -> StorageResult<()> {
        let row = DbRecord::from_record(record)?;

        if self.find_record_row(&record.owner_id).await?.is_some() {
            debug!("Replacing academic record");

            let mut result = self
                .db
                .query(
                    "UPDATE academic_records SET registration_number = $reg, document = $doc, updated_at = $now WHERE owner_id = $owner",
                )
                .bind(("reg", row.registration_number))
                .bind(("doc", row.document))
                .bind(("now", row.updated_at))
                .bind(("owner", row.owner_id))
                .await?;

            let updated: Vec<DbRecord> = result.take(0)?;
            if updated.is_empty() {
                return Err(StorageError::Query(
                    "Failed to update academic record".to_string(),
                ));
            }
        } else {
            debug!("Creating academic record");

            let created: Option<DbRecord> =
                self.db.create("academic_records").content(row).await?;
            if created.is_none() {
                return Err(StorageError::Query(
                    "Failed to create academic record".to_string(),
                ));
            }
        }

        info!("Academic record saved: {}", record.owner_id);
        Ok(())
    }

    /// Delete the record for an owner
    #[instrument(skip(self))]
    pub async fn delete_record(&self, owner_id: &str) -> StorageResult<()> {
        let owner_owned = owner_id.to_string();

        let mut result = self
            .db
            .query("DELETE academic_records WHERE owner_id = $owner RETURN BEFORE")
            .bind(("owner", owner_owned))
            .await?;

        let removed: Vec<DbRecord> = result.take(0)?;
        if removed.is_empty() {
            return Err(StorageError::RecordNotFound {
                owner_id: owner_id.to_string(),
            });
        }

        info!("Academic record deleted: {}", owner_id);
        Ok(())
    }

    // ========== Profile Operations ==========

    /// Registration number on file for an owner
    #[instrument(skip(self))]
    pub async fn load_profile(&self, owner_id: &str) -> StorageResult<Option<String>> {
        let owner_owned = owner_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM student_profiles WHERE owner_id = $owner")
            .bind(("owner", owner_owned))
            .await?;

        let profiles: Vec<DbProfile> = result.take(0)?;
        Ok(profiles.into_iter().next().map(|p| p.registration_number))
    }

    /// Create or replace the profile for an owner
    #[instrument(skip(self))]
    pub async fn save_profile(&self, owner_id: &str, registration_number: &str) -> StorageResult<()> {
        let profile = DbProfile {
            owner_id: owner_id.to_string(),
            registration_number: normalize_registration(registration_number),
        };

        if self.load_profile(owner_id).await?.is_some() {
            let mut result = self
                .db
                .query("UPDATE student_profiles SET registration_number = $reg WHERE owner_id = $owner")
                .bind(("reg", profile.registration_number))
                .bind(("owner", profile.owner_id))
                .await?;

            let updated: Vec<DbProfile> = result.take(0)?;
            if updated.is_empty() {
                return Err(StorageError::Query("Failed to update profile".to_string()));
            }
        } else {
            let created: Option<DbProfile> =
                self.db.create("student_profiles").content(profile).await?;
            if created.is_none() {
                return Err(StorageError::Query("Failed to create profile".to_string()));
            }
        }

        debug!("Profile saved: {}", owner_id);
        Ok(())
    }
}
