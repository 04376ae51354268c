//! Folder tree operations.
//!
//! Folders nest through `parent_folder_id`. Moving a folder is checked so the
//! tree can never contain a cycle, and deleting a folder removes its whole
//! subtree together with the pages inside it.

use super::double_option;
use crate::{
    entities::{Folder, Page, folder, page},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::info;

/// Name given to folders created without one.
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

/// Request body for creating a folder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder {
    /// Folder name
    pub name: Option<String>,
    /// Parent folder, root when absent
    pub parent_folder_id: Option<i64>,
}

/// Partial update of a folder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUpdate {
    /// New name
    pub name: Option<String>,
    /// `Some(None)` moves the folder to the root
    #[serde(default, deserialize_with = "double_option")]
    pub parent_folder_id: Option<Option<i64>>,
    /// New position among siblings
    pub order: Option<i32>,
    /// Sidebar expansion state
    pub is_expanded: Option<bool>,
}

/// All folders of a user, by position.
pub async fn list_folders(db: &DatabaseConnection, user_id: i64) -> Result<Vec<folder::Model>> {
    Folder::find()
        .filter(folder::Column::UserId.eq(user_id))
        .order_by_asc(folder::Column::SortOrder)
        .order_by_asc(folder::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One folder owned by `user_id`.
pub async fn get_folder<C>(db: &C, user_id: i64, folder_id: i64) -> Result<folder::Model>
where
    C: ConnectionTrait,
{
    Folder::find_by_id(folder_id)
        .filter(folder::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error::FolderNotFound { id: folder_id })
}

async fn next_sibling_order(
    db: &DatabaseConnection,
    user_id: i64,
    parent_folder_id: Option<i64>,
) -> Result<i32> {
    let parent_filter = match parent_folder_id {
        Some(id) => folder::Column::ParentFolderId.eq(id),
        None => folder::Column::ParentFolderId.is_null(),
    };
    let last = Folder::find()
        .filter(folder::Column::UserId.eq(user_id))
        .filter(parent_filter)
        .order_by_desc(folder::Column::SortOrder)
        .one(db)
        .await?;
    Ok(last.map_or(0, |f| f.sort_order + 1))
}

/// Creates a folder at the end of its siblings.
pub async fn create_folder(
    db: &DatabaseConnection,
    user_id: i64,
    new_folder: NewFolder,
) -> Result<folder::Model> {
    if let Some(parent_id) = new_folder.parent_folder_id {
        get_folder(db, user_id, parent_id).await?;
    }

    let name = new_folder
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_FOLDER_NAME.to_string());
    let now = Utc::now();

    let folder = folder::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        parent_folder_id: Set(new_folder.parent_folder_id),
        sort_order: Set(next_sibling_order(db, user_id, new_folder.parent_folder_id).await?),
        is_expanded: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    folder.insert(db).await.map_err(Into::into)
}

/// Rejects a move of `folder_id` under `new_parent` that would create a cycle.
async fn ensure_no_cycle(
    db: &DatabaseConnection,
    user_id: i64,
    folder_id: i64,
    new_parent: i64,
) -> Result<()> {
    let mut seen = HashSet::new();
    let mut cursor = Some(new_parent);

    while let Some(current) = cursor {
        if current == folder_id {
            return Err(Error::validation(
                "A folder cannot be moved into itself or its descendants",
            ));
        }
        if !seen.insert(current) {
            break;
        }
        cursor = get_folder(db, user_id, current).await?.parent_folder_id;
    }
    Ok(())
}

/// Applies `update` to a folder.
pub async fn update_folder(
    db: &DatabaseConnection,
    user_id: i64,
    folder_id: i64,
    update: FolderUpdate,
) -> Result<folder::Model> {
    let existing = get_folder(db, user_id, folder_id).await?;
    let mut active_model: folder::ActiveModel = existing.into();

    if let Some(name) = update.name {
        if name.trim().is_empty() {
            return Err(Error::validation("Folder name cannot be empty"));
        }
        active_model.name = Set(name.trim().to_string());
    }
    if let Some(parent) = update.parent_folder_id {
        if let Some(parent_id) = parent {
            ensure_no_cycle(db, user_id, folder_id, parent_id).await?;
        }
        active_model.parent_folder_id = Set(parent);
    }
    if let Some(order) = update.order {
        active_model.sort_order = Set(order);
    }
    if let Some(expanded) = update.is_expanded {
        active_model.is_expanded = Set(expanded);
    }
    active_model.updated_at = Set(Utc::now());

    active_model.update(db).await.map_err(Into::into)
}

/// Deletes a folder, every folder below it and every page inside any of them,
/// in one transaction. Returns the number of folders removed.
pub async fn delete_folder(db: &DatabaseConnection, user_id: i64, folder_id: i64) -> Result<u64> {
    let txn = db.begin().await?;
    get_folder(&txn, user_id, folder_id).await?;

    let mut subtree = vec![folder_id];
    let mut frontier = vec![folder_id];
    while !frontier.is_empty() {
        let children: Vec<i64> = Folder::find()
            .filter(folder::Column::UserId.eq(user_id))
            .filter(folder::Column::ParentFolderId.is_in(frontier))
            .all(&txn)
            .await?
            .into_iter()
            .map(|f| f.id)
            .filter(|id| !subtree.contains(id))
            .collect();
        subtree.extend(&children);
        frontier = children;
    }

    let pages = Page::delete_many()
        .filter(page::Column::UserId.eq(user_id))
        .filter(page::Column::FolderId.is_in(subtree.clone()))
        .exec(&txn)
        .await?;
    let folders = Folder::delete_many()
        .filter(folder::Column::UserId.eq(user_id))
        .filter(folder::Column::Id.is_in(subtree))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(
        user_id,
        folder_id,
        folders = folders.rows_affected,
        pages = pages.rows_affected,
        "Deleted folder subtree"
    );
    Ok(folders.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_folder, create_test_user, setup_test_db};

    #[tokio::test]
    async fn test_create_folder_appends_to_siblings() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "folders@example.com").await?;

        let first = create_folder(&db, user.id, NewFolder::default()).await?;
        let second = create_test_folder(&db, user.id, "Trips", None).await?;
        let child = create_test_folder(&db, user.id, "Japan", Some(second.id)).await?;

        assert_eq!(first.name, DEFAULT_FOLDER_NAME);
        assert!(first.is_expanded);
        assert_eq!(first.sort_order, 0);
        assert_eq!(second.sort_order, 1);
        assert_eq!(child.sort_order, 0);
        assert_eq!(list_folders(&db, user.id).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_folders_are_private_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;
        let other = create_test_user(&db, "other@example.com").await?;
        let folder = create_test_folder(&db, owner.id, "Mine", None).await?;

        let result = get_folder(&db, other.id, folder.id).await;
        assert!(matches!(result, Err(Error::FolderNotFound { .. })));

        let parent_elsewhere = NewFolder {
            name: Some("Sneaky".to_string()),
            parent_folder_id: Some(folder.id),
        };
        let result = create_folder(&db, other.id, parent_elsewhere).await;
        assert!(matches!(result, Err(Error::FolderNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_move_into_descendant_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "cycle@example.com").await?;
        let a = create_test_folder(&db, user.id, "A", None).await?;
        let b = create_test_folder(&db, user.id, "B", Some(a.id)).await?;
        let c = create_test_folder(&db, user.id, "C", Some(b.id)).await?;

        let into_grandchild = FolderUpdate {
            parent_folder_id: Some(Some(c.id)),
            ..Default::default()
        };
        let result = update_folder(&db, user.id, a.id, into_grandchild).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let into_self = FolderUpdate {
            parent_folder_id: Some(Some(a.id)),
            ..Default::default()
        };
        let result = update_folder(&db, user.id, a.id, into_self).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let to_root = FolderUpdate {
            parent_folder_id: Some(None),
            is_expanded: Some(false),
            ..Default::default()
        };
        let moved = update_folder(&db, user.id, c.id, to_root).await?;
        assert_eq!(moved.parent_folder_id, None);
        assert!(!moved.is_expanded);
        Ok(())
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: FolderUpdate = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        let null: FolderUpdate = serde_json::from_str(r#"{"parentFolderId":null}"#).unwrap();
        let set: FolderUpdate = serde_json::from_str(r#"{"parentFolderId":4}"#).unwrap();

        assert_eq!(absent.parent_folder_id, None);
        assert_eq!(null.parent_folder_id, Some(None));
        assert_eq!(set.parent_folder_id, Some(Some(4)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subtree_and_pages() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "cascade@example.com").await?;
        let root = create_test_folder(&db, user.id, "Root", None).await?;
        let child = create_test_folder(&db, user.id, "Child", Some(root.id)).await?;
        let grandchild = create_test_folder(&db, user.id, "Grandchild", Some(child.id)).await?;
        let sibling = create_test_folder(&db, user.id, "Sibling", None).await?;

        let new_page = |folder_id| crate::core::page::NewPage {
            folder_id: Some(folder_id),
            ..Default::default()
        };
        crate::core::page::create_page(&db, user.id, new_page(root.id)).await?;
        crate::core::page::create_page(&db, user.id, new_page(grandchild.id)).await?;
        let kept = crate::core::page::create_page(&db, user.id, new_page(sibling.id)).await?;

        let removed = delete_folder(&db, user.id, root.id).await?;

        assert_eq!(removed, 3);
        let remaining: Vec<i64> = list_folders(&db, user.id).await?.iter().map(|f| f.id).collect();
        assert_eq!(remaining, vec![sibling.id]);
        let pages = Page::find().all(&db).await?;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, kept.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_folder_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "missing@example.com").await?;
        let result = delete_folder(&db, user.id, 42).await;
        assert!(matches!(result, Err(Error::FolderNotFound { id: 42 })));
        Ok(())
    }
}
