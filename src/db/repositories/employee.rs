//! Employee repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Employee;

/// Employee repository trait
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Create a new employee
    async fn create(&self, employee: &Employee) -> Result<Employee>;

    /// Get employee by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Employee>>;

    /// Look up an employee by NFC badge number
    async fn get_by_nfc(&self, nfc_number: &str) -> Result<Option<Employee>>;

    /// List all employees
    async fn list(&self) -> Result<Vec<Employee>>;

    /// Update an employee
    async fn update(&self, employee: &Employee) -> Result<Option<Employee>>;

    /// Delete an employee; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if an NFC number is already registered
    async fn exists_by_nfc(&self, nfc_number: &str) -> Result<bool>;
}

/// SQLx-based employee repository
pub struct SqlxEmployeeRepository {
    pool: DbPool,
}

impl SqlxEmployeeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn EmployeeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EmployeeRepository for SqlxEmployeeRepository {
    async fn create(&self, employee: &Employee) -> Result<Employee> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, email, nfc_number, department_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.nfc_number)
        .bind(employee.department_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create employee")?;

        Ok(Employee {
            id: result.last_insert_rowid(),
            name: employee.name.clone(),
            email: employee.email.clone(),
            nfc_number: employee.nfc_number.clone(),
            department_id: employee.department_id,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, name, email, nfc_number, department_id, created_at FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get employee by ID")?;

        Ok(row.map(|row| row_to_employee(&row)))
    }

    async fn get_by_nfc(&self, nfc_number: &str) -> Result<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, name, email, nfc_number, department_id, created_at FROM employees WHERE nfc_number = ?",
        )
        .bind(nfc_number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get employee by NFC number")?;

        Ok(row.map(|row| row_to_employee(&row)))
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        let rows = sqlx::query(
            "SELECT id, name, email, nfc_number, department_id, created_at FROM employees ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list employees")?;

        Ok(rows.iter().map(row_to_employee).collect())
    }

    async fn update(&self, employee: &Employee) -> Result<Option<Employee>> {
        let result = sqlx::query(
            "UPDATE employees SET name = ?, email = ?, nfc_number = ?, department_id = ? WHERE id = ?",
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.nfc_number)
        .bind(employee.department_id)
        .bind(employee.id)
        .execute(&self.pool)
        .await
        .context("Failed to update employee")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(employee.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete employee")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_nfc(&self, nfc_number: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM employees WHERE nfc_number = ?")
            .bind(nfc_number)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check NFC number existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Employee {
    Employee {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        nfc_number: row.get("nfc_number"),
        department_id: row.get("department_id"),
        created_at: row.get("created_at"),
    }
}
