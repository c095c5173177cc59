use std::time::Duration;

use application::{MessageRepository, ParticipantRepository};
use async_trait::async_trait;
use domain::{
    Message, MessageId, MessageKind, NewMessage, NewParticipant, Participant, ParticipantId,
    RepositoryError,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL 唯一约束冲突
const UNIQUE_VIOLATION: &str = "23505";

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    let conflict = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if conflict {
        return RepositoryError::Conflict;
    }
    RepositoryError::storage_with_source(err.to_string(), err)
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    id: Uuid,
    name: String,
    last_status: i64,
}

impl From<ParticipantRecord> for Participant {
    fn from(value: ParticipantRecord) -> Self {
        Participant {
            id: ParticipantId::from(value.id),
            name: value.name,
            last_status: value.last_status,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender: String,
    recipient: String,
    body: String,
    kind: String,
    display_time: String,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let kind = value.kind.parse::<MessageKind>().map_err(invalid_data)?;
        Ok(Message {
            id: MessageId::from(value.id),
            from: value.sender,
            to: value.recipient,
            text: value.body,
            kind,
            time: value.display_time,
        })
    }
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn insert(&self, participant: NewParticipant) -> Result<ParticipantId, RepositoryError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO participants (id, name, last_status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(&participant.name)
        .bind(participant.last_status)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(ParticipantId::from(id))
    }

    async fn find_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            SELECT id, name, last_status
            FROM participants
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Participant::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Participant>, RepositoryError> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            SELECT id, name, last_status
            FROM participants
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Participant::from))
    }

    async fn touch(&self, name: &str, last_status: i64) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE participants SET last_status = $2 WHERE name = $1")
            .bind(name)
            .bind(last_status)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn delete_stale(&self, now_ms: i64, stale_after_ms: i64) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM participants WHERE $1 - last_status > $2")
            .bind(now_ms)
            .bind(stale_after_ms)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: NewMessage) -> Result<MessageId, RepositoryError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender, recipient, body, kind, display_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(MessageId::from(id))
    }

    async fn find_visible(
        &self,
        user: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RepositoryError> {
        // LIMIT NULL 等同于不限制
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender, recipient, body, kind, display_time
            FROM messages
            WHERE sender = $1 OR recipient = $1 OR recipient = $2
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(user)
        .bind(domain::BROADCAST_RECIPIENT)
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender, recipient, body, kind, display_time
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn replace(&self, message: Message) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET sender = $2, recipient = $3, body = $4, kind = $5, display_time = $6
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: MessageId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: &str) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            sender: "ana".into(),
            recipient: "Todos".into(),
            body: "oi".into(),
            kind: kind.into(),
            display_time: "09:00:00".into(),
        }
    }

    #[test]
    fn message_record_maps_columns_to_wire_fields() {
        let message = Message::try_from(record("status")).unwrap();
        assert_eq!(message.from, "ana");
        assert_eq!(message.to, "Todos");
        assert_eq!(message.text, "oi");
        assert_eq!(message.kind, MessageKind::Status);
        assert_eq!(message.time, "09:00:00");
    }

    #[test]
    fn unknown_kind_in_row_is_a_storage_error() {
        let err = Message::try_from(record("shout")).unwrap_err();
        assert!(matches!(err, RepositoryError::Storage { .. }));
    }

    #[test]
    fn non_database_errors_are_storage_errors() {
        let err = map_sqlx_err(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::Storage { .. }));
    }
}
