//! SQL and procedure calls issued against every city database.

use citydash_shard::shaping::PeriodFilter;
use citydash_shard::{QuerySpec, Scope};

const INVOICE_LISTING: &str = "dbo.sp_facturas_listar_resumen_con_ciudad";
const INVOICE_DETAIL: &str = "dbo.sp_ver_factura_completa";
const PURCHASE_ORDER_DETAIL: &str = "dbo.sp_ver_oc_completa";
const ACCOUNTING_ENTRY_DETAIL: &str = "dbo.sp_ver_asiento_completo";
const ADJUSTMENT_DETAIL: &str = "dbo.sp_ver_ajuste_completo_unido";
const PAYROLL_DETAIL: &str = "dbo.sp_tthh_ver_detalle_pago_empleado";
const GENERAL_LOG: &str = "dbo.sp_ver_log_general";

pub const GENERAL_LOG_LIMIT: i32 = 50;

const EMPLOYEES: &str = "\
SELECT
    E.id_Empleado, E.emp_Cedula, E.emp_Nombre1, E.emp_Nombre2,
    E.emp_Apellido1, E.emp_Apellido2, E.emp_Sexo, E.emp_FechaNacimiento,
    E.emp_Sueldo, E.emp_Mail, D.dep_Nombre, R.rol_Descripcion,
    E.id_Ciudad AS EmpleadoCiudadAsignada,
    (SELECT TOP 1 CP.nombre_ciudad
     FROM ciuxprov CP
     WHERE LEFT(E.emp_Cedula, 2) = CP.codigo_provincia
     ORDER BY CP.nombre_ciudad) AS CiudadCedula
FROM Empleados E
LEFT JOIN Departamentos D ON E.id_Departamento = D.id_Departamento
LEFT JOIN Roles R ON E.id_Rol = R.id_Rol";
const EMPLOYEES_ORDER: &str = "ORDER BY E.emp_Apellido1, E.emp_Nombre1";

const PURCHASES: &str = "\
SELECT id_Compra, id_Proveedor, oc_Fecha_Hora, oc_Subtotal, oc_IVA, ESTADO_OC
FROM COMPRAS";
const PURCHASES_ORDER: &str = "ORDER BY oc_Fecha_Hora DESC";

const ACCOUNTING_ENTRIES: &str = "\
SELECT id_Asiento, asi_Fecha_Hora, asi_Descripcion, ESTADO_ASI
FROM ASIENTOS
ORDER BY asi_Fecha_Hora DESC, id_Asiento DESC";

const ADJUSTMENTS: &str = "\
SELECT id_Ajuste, USER_ID, aju_Descripcion, aju_FechaHora, aju_Num_Produc, ESTADO_AJU
FROM AJUSTES";
const ADJUSTMENTS_ORDER: &str = "ORDER BY aju_FechaHora DESC, id_Ajuste DESC";

// Both statements go out in one batch so the shard answers with two
// result sets: payment periods, then bonus and discount lines.
const PAYROLL_ALL_PERIODS: &str = "\
SELECT
    id_Pago AS Pago, id_Empleado AS Empleado, emp_Sueldo AS Sueldo,
    emp_Bonificaciones AS Bonificaciones, emp_Descuentos AS Descuentos,
    emp_Valor_Neto AS Neto, ESTADO_PxE AS Estado
FROM PagxEmp
WHERE id_Empleado = @P1
ORDER BY id_Pago DESC;

SELECT
    id_Bonificacion AS id_detalle, 'BON' AS tipo_detalle, bxe_Fecha AS fecha,
    bxe_Valor AS valor, ESTADO_BXE AS estado, id_Empleado, id_Pago
FROM BonxEmpxPag
WHERE id_Empleado = @P1
UNION ALL
SELECT
    id_Descuento AS id_detalle, 'DES' AS tipo_detalle, dxe_Fecha AS fecha,
    dxe_Valor AS valor, ESTADO_DXE AS estado, id_Empleado, id_Pago
FROM DesxEmpxPag
WHERE id_Empleado = @P1
ORDER BY fecha DESC, tipo_detalle, id_detalle;";

/// Listing filtered by `id_Ciudad` when the scope names one city.
fn city_filtered(scope: &Scope, select: &str, city_column: &str, order: &str) -> QuerySpec {
    match scope.shard_code() {
        Some(code) => QuerySpec::text(format!(
            "{select}\nWHERE {city_column} = @P1\n{order}"
        ))
        .bind(code)
        .into(),
        None => QuerySpec::text(format!("{select}\n{order}")).into(),
    }
}

/// The procedure takes NULL to list every invoice in the database.
pub fn invoice_listing(scope: &Scope) -> QuerySpec {
    QuerySpec::procedure(INVOICE_LISTING)
        .arg("p_id_ciudad", scope.shard_code())
        .into()
}

pub fn employees(scope: &Scope) -> QuerySpec {
    city_filtered(scope, EMPLOYEES, "E.id_Ciudad", EMPLOYEES_ORDER)
}

pub fn purchases(scope: &Scope) -> QuerySpec {
    city_filtered(scope, PURCHASES, "id_Ciudad", PURCHASES_ORDER)
}

pub fn accounting_entries() -> QuerySpec {
    QuerySpec::text(ACCOUNTING_ENTRIES).into()
}

pub fn adjustments(scope: &Scope) -> QuerySpec {
    city_filtered(scope, ADJUSTMENTS, "id_Ciudad", ADJUSTMENTS_ORDER)
}

pub fn general_log() -> QuerySpec {
    QuerySpec::procedure(GENERAL_LOG)
        .arg("p_limit", GENERAL_LOG_LIMIT)
        .into()
}

pub fn invoice_detail(id: &str) -> QuerySpec {
    QuerySpec::procedure(INVOICE_DETAIL).arg("p_id_factura", id).into()
}

pub fn purchase_order_detail(id: &str) -> QuerySpec {
    QuerySpec::procedure(PURCHASE_ORDER_DETAIL).arg("p_id_oc", id).into()
}

pub fn accounting_entry_detail(id: &str) -> QuerySpec {
    QuerySpec::procedure(ACCOUNTING_ENTRY_DETAIL)
        .arg("p_id_Asiento", id)
        .into()
}

pub fn adjustment_detail(id: &str) -> QuerySpec {
    QuerySpec::procedure(ADJUSTMENT_DETAIL).arg("p_id_ajuste", id).into()
}

/// One exact period goes through the procedure; anything broader reads
/// every period and is narrowed in process.
pub fn payroll(employee: &str, filter: &PeriodFilter) -> QuerySpec {
    match (filter.year, filter.month.as_deref()) {
        (Some(year), Some(month)) => QuerySpec::procedure(PAYROLL_DETAIL)
            .arg("p_emp_codigo", employee)
            .arg("p_year", year.to_string())
            .arg("p_month", month)
            .into(),
        _ => QuerySpec::text(PAYROLL_ALL_PERIODS).bind(employee).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citydash_shard::ParamValue;

    #[test]
    fn invoice_listing_sends_null_for_all_cities() {
        let all = invoice_listing(&Scope::All);
        let (sql, params) = all.batch();
        assert_eq!(sql, "EXEC dbo.sp_facturas_listar_resumen_con_ciudad @p_id_ciudad = @P1");
        assert_eq!(params, vec![&ParamValue::Text(None)]);

        let gye = invoice_listing(&Scope::shard("gye"));
        let (_, params) = gye.batch();
        assert_eq!(params, vec![&ParamValue::Text(Some("GYE".into()))]);
    }

    #[test]
    fn listings_filter_by_city_only_for_one_shard() {
        let all = purchases(&Scope::All);
        let (sql, params) = all.batch();
        assert!(!sql.contains("WHERE"));
        assert!(params.is_empty());

        let cue = adjustments(&Scope::shard("CUE"));
        let (sql, params) = cue.batch();
        assert!(sql.contains("WHERE id_Ciudad = @P1\nORDER BY aju_FechaHora DESC"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn payroll_uses_procedure_for_exact_period() {
        let exact = PeriodFilter::parse(Some("2024"), Some("5")).unwrap();
        let query = payroll("E001", &exact);
        let (sql, params) = query.batch();
        assert_eq!(
            sql,
            "EXEC dbo.sp_tthh_ver_detalle_pago_empleado @p_emp_codigo = @P1, @p_year = @P2, @p_month = @P3"
        );
        assert_eq!(params[2], &ParamValue::Text(Some("05".into())));

        let broad = PeriodFilter::parse(Some("2024"), Some("ALL")).unwrap();
        let query = payroll("E001", &broad);
        let (sql, params) = query.batch();
        assert!(sql.starts_with("SELECT"));
        assert_eq!(params.len(), 1);
    }
}
