//! Document store for TradeFlow, backed by Sled.
//!
//! One tree per collection (`users`, `scripts`, `products`, `admin`) with
//! Serde-serialized JSON documents, the single source of truth for the
//! whole service. Ids and creation timestamps are assigned here, never by
//! callers, so ordering does not depend on client clocks. The store offers
//! no cross-session ordering guarantees: concurrent writers race and the
//! last write wins.

use crate::error::{AppError, Result};
use crate::models::{AdminConfig, MediaType, Product, Role, Script, ScriptStatus, User};
use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use uuid::Uuid;

/// Key of the `admin/config` singleton document.
const ADMIN_CONFIG_KEY: &[u8] = b"config";

#[allow(dead_code)] // db kept for future ops like flush/close on Sled
#[derive(Clone)] // Clone for sharing across handlers (Sled internals cheap to clone)
pub struct Storage {
    db: Db,
    // Trees, one per collection:
    // - users/emails: accounts plus an email -> id index for sign-in
    // - scripts: submitted strategies under moderation
    // - products: the admin-managed catalog
    // - admin: singleton config documents
    users: Tree,
    emails: Tree,
    scripts: Tree,
    products: Tree,
    admin: Tree,
}

/// Fields a submission supplies; everything else on a [`Script`] is
/// store-assigned.
#[derive(Debug, Clone)]
pub struct NewScript {
    pub title: String,
    pub description: String,
    pub indicators: Vec<String>,
    pub user_id: String,
    pub user_email: Option<String>,
    pub screenshot: Option<String>,
}

/// Fields the product form supplies. `media_url`/`doc_url` of `None` keep
/// whatever the existing record holds on update.
#[derive(Debug, Clone, Default)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub price: String,
    pub original_price: String,
    pub discount: String,
    pub rating: String,
    pub reviews: String,
    pub compatibility: Vec<String>,
    pub detailed_description: Vec<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub doc_url: Option<String>,
}

impl Storage {
    /// Open or create the Sled database at the given path and its
    /// collection trees.
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        let users = db.open_tree("users")?;
        let emails = db.open_tree("emails")?;
        let scripts = db.open_tree("scripts")?;
        let products = db.open_tree("products")?;
        let admin = db.open_tree("admin")?;
        Ok(Self {
            db,
            users,
            emails,
            scripts,
            products,
            admin,
        })
    }

    // --- users ---

    /// Create the account document for a fresh sign-up. Fails validation if
    /// the email is already registered.
    pub fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User> {
        if self.emails.contains_key(email.as_bytes())? {
            return Err(AppError::Validation(format!(
                "an account already exists for {email}"
            )));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            role,
            created_at: Utc::now(),
        };
        self.users
            .insert(user.id.as_bytes(), serde_json::to_vec(&user)?)?;
        self.emails.insert(email.as_bytes(), user.id.as_bytes())?;
        Ok(user)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        match self.users.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.emails.get(email.as_bytes())? {
            Some(id) => {
                let id = String::from_utf8_lossy(&id).to_string();
                self.get_user(&id)
            }
            None => Ok(None),
        }
    }

    /// Role of an identity, straight from the raw document. Returns `None`
    /// when the document is missing or carries no usable role field; the
    /// documents are schemaless, so a role-less record is not an error.
    pub fn user_role(&self, id: &str) -> Result<Option<Role>> {
        let Some(bytes) = self.users.get(id.as_bytes())? else {
            return Ok(None);
        };
        let doc: serde_json::Value = serde_json::from_slice(&bytes)?;
        let role = doc
            .get("role")
            .and_then(|r| serde_json::from_value::<Role>(r.clone()).ok());
        Ok(role)
    }

    // --- scripts ---

    /// Insert a freshly submitted script (`status = pending`) and bump the
    /// dashboard counter in the same transaction, so `scriptsCount` can not
    /// drift from the collection.
    pub fn create_script(&self, new: NewScript) -> Result<Script> {
        let script = Script {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            indicators: new.indicators,
            user_id: new.user_id,
            user_email: new.user_email,
            screenshot: new.screenshot,
            pine_script: None,
            status: ScriptStatus::Pending,
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        let script_bytes = serde_json::to_vec(&script)?;

        let result: std::result::Result<(), TransactionError<AppError>> =
            (&self.scripts, &self.admin).transaction(|(scripts, admin)| {
                scripts.insert(script.id.as_bytes(), script_bytes.clone())?;

                let mut config = match admin.get(ADMIN_CONFIG_KEY)? {
                    Some(raw) => serde_json::from_slice::<AdminConfig>(&raw)
                        .map_err(|e| ConflictableTransactionError::Abort(AppError::Codec(e)))?,
                    None => AdminConfig::default(),
                };
                config.scripts_count += 1;
                let config_bytes = serde_json::to_vec(&config)
                    .map_err(|e| ConflictableTransactionError::Abort(AppError::Codec(e)))?;
                admin.insert(ADMIN_CONFIG_KEY, config_bytes)?;
                Ok(())
            });

        match result {
            Ok(()) => Ok(script),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(AppError::Store(err)),
        }
    }

    pub fn get_script(&self, id: &str) -> Result<Option<Script>> {
        match self.scripts.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Overwrite a script document in place (moderation updates).
    pub fn put_script(&self, script: &Script) -> Result<()> {
        self.scripts
            .insert(script.id.as_bytes(), serde_json::to_vec(script)?)?;
        Ok(())
    }

    /// Remove a script document entirely. Returns whether it existed.
    pub fn delete_script(&self, id: &str) -> Result<bool> {
        Ok(self.scripts.remove(id.as_bytes())?.is_some())
    }

    /// Full collection scan, in key order; callers sort.
    pub fn list_scripts(&self) -> Result<Vec<Script>> {
        let mut scripts = Vec::new();
        for item in self.scripts.iter() {
            let (_, bytes) = item?;
            scripts.push(serde_json::from_slice(&bytes)?);
        }
        Ok(scripts)
    }

    pub fn list_scripts_for_user(&self, user_id: &str) -> Result<Vec<Script>> {
        let mut scripts: Vec<Script> = Vec::new();
        for item in self.scripts.iter() {
            let (_, bytes) = item?;
            let script: Script = serde_json::from_slice(&bytes)?;
            if script.user_id == user_id {
                scripts.push(script);
            }
        }
        Ok(scripts)
    }

    // --- products ---

    pub fn create_product(&self, fields: ProductFields) -> Result<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            description: fields.description,
            price: fields.price,
            original_price: fields.original_price,
            discount: fields.discount,
            rating: fields.rating,
            reviews: fields.reviews,
            compatibility: fields.compatibility,
            detailed_description: fields.detailed_description,
            media_url: fields.media_url.unwrap_or_default(),
            media_type: fields.media_type.unwrap_or_default(),
            doc_url: fields.doc_url,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.products
            .insert(product.id.as_bytes(), serde_json::to_vec(&product)?)?;
        Ok(product)
    }

    /// Apply the form fields over an existing product. Media references are
    /// only replaced when a new upload supplied them; `created_at` is kept.
    pub fn update_product(&self, id: &str, fields: ProductFields) -> Result<Product> {
        let mut product = self
            .get_product(id)?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
        product.title = fields.title;
        product.description = fields.description;
        product.price = fields.price;
        product.original_price = fields.original_price;
        product.discount = fields.discount;
        product.rating = fields.rating;
        product.reviews = fields.reviews;
        product.compatibility = fields.compatibility;
        product.detailed_description = fields.detailed_description;
        if let Some(media_url) = fields.media_url {
            product.media_url = media_url;
        }
        if let Some(media_type) = fields.media_type {
            product.media_type = media_type;
        }
        if let Some(doc_url) = fields.doc_url {
            product.doc_url = Some(doc_url);
        }
        product.updated_at = Some(Utc::now());
        self.products
            .insert(product.id.as_bytes(), serde_json::to_vec(&product)?)?;
        Ok(product)
    }

    pub fn get_product(&self, id: &str) -> Result<Option<Product>> {
        match self.products.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn delete_product(&self, id: &str) -> Result<bool> {
        Ok(self.products.remove(id.as_bytes())?.is_some())
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let mut products = Vec::new();
        for item in self.products.iter() {
            let (_, bytes) = item?;
            products.push(serde_json::from_slice(&bytes)?);
        }
        Ok(products)
    }

    // --- admin ---

    /// Dashboard config; a missing document reads as a zero counter.
    pub fn admin_config(&self) -> Result<AdminConfig> {
        match self.admin.get(ADMIN_CONFIG_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(AdminConfig::default()),
        }
    }
}
