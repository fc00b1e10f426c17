//! Built-in census steps
//!
//! Field names are the wire keys of the census API. Yes/no questions that
//! open follow-up fields get a clear rule, so answering "Não" resets the
//! follow-ups instead of submitting stale answers.

use wizard_reconcile::{ClearRule, ComplementaryRule, Predicate, RuleTable};
use wizard_snapshot::{
    FieldGroup, FieldSpec, SectionId, SectionSchema, SectionSchemaBuilder, Shift, SnapshotError,
};

const YES: &str = "Sim";
const NO: &str = "Não";
const YES_NO: &[&str] = &[YES, NO];
const YES_PARTIAL_NO: &[&str] = &["Sim", "Parcialmente", "Não"];
const BUILDING: &[&str] = &["Próprio", "Alugado", "Compartilhado", "Cedido"];
const EQUIPMENT_STATE: &[&str] = &[
    "Bom – funcionando plenamente",
    "Regular – funciona, com limitações",
    "Ruim – funcionamento comprometido",
    "Inoperante",
];
const EXECUTION: &[&str] = &["Sim, totalmente", "Parcialmente", "Não executados"];
const PENDING: &[&str] = &["Não", "Sim, em regularização", "Sim, pendente/atrasada"];
const RATING: &[&str] = &["Ruim", "Regular", "Bom", "Excelente"];

type Section = (SectionSchema, RuleTable);

fn builder(id: &str, title: &str) -> Result<SectionSchemaBuilder, SnapshotError> {
    Ok(SectionSchema::builder(SectionId::new(id)?, title))
}

fn when_yes(controller: &str, dependents: &[&str]) -> ClearRule {
    ClearRule::new(controller, Predicate::equals(YES), dependents)
}

fn when_no(controller: &str, dependents: &[&str]) -> ClearRule {
    ClearRule::new(controller, Predicate::equals(NO), dependents)
}

/// Every census step, in wizard order
pub(crate) fn sections() -> Result<Vec<Section>, SnapshotError> {
    Ok(vec![
        identification()?,
        general()?,
        food()?,
        cleaning()?,
        security()?,
        tech()?,
        staff()?,
        students()?,
        management()?,
        rating()?,
        observations()?,
    ])
}

fn identification() -> Result<Section, SnapshotError> {
    let schema = builder("identification", "Identificação")?
        .field(FieldSpec::text("dre").required())
        .field(FieldSpec::text("municipio").required())
        .field(FieldSpec::text("nome_escola").required())
        .field(FieldSpec::text("codigo_inep").required())
        .field(FieldSpec::choice("zona", &["Urbana", "Rural", "Ribeirinha"]).required())
        .field(FieldSpec::text("endereco").required())
        .field(FieldSpec::text("cep"))
        .field(FieldSpec::text("cnpj"))
        .field(FieldSpec::text("telefone_institucional"))
        .field(FieldSpec::text("dependencia_administrativa"))
        .field(FieldSpec::text("nome_diretor"))
        .field(FieldSpec::text("matricula_diretor"))
        .field(FieldSpec::text("contato_diretor"))
        .build()?;
    Ok((schema, RuleTable::new()))
}

fn general() -> Result<Section, SnapshotError> {
    let schema = builder("general", "Dados Gerais e Infraestrutura")?
        .field(FieldSpec::choice("tipo_predio", BUILDING).required())
        .field(FieldSpec::choice("possui_anexos", YES_NO).required())
        .field(FieldSpec::number("qtd_anexos"))
        .field(FieldSpec::choice("tipo_predio_anexo", BUILDING))
        .field(
            FieldSpec::multi_choice(
                "etapas_ofertadas",
                &[
                    "Ensino Infantil",
                    "Ensino Fundamental I",
                    "Ensino Fundamental II",
                    "Ensino Médio",
                ],
            )
            .required(),
        )
        .field(
            FieldSpec::multi_choice(
                "modalidades_ofertadas",
                &[
                    "Ensino Regular",
                    "Ensino Integral",
                    "Educação de Jovens e Adultos (EJA)",
                    "Educação Especial",
                    "Educação Profissional e Tecnológica",
                    "Educação do Campo",
                    "Educação Escolar Indígena",
                    "Educação Quilombola",
                    "CEMEP",
                    "SOME",
                    "PPL",
                ],
            )
            .required(),
        )
        .field(FieldSpec::number("qtd_salas_aula").required())
        .field(FieldSpec::number("turmas_manha"))
        .field(FieldSpec::number("turmas_tarde"))
        .field(FieldSpec::number("turmas_noite"))
        .field(FieldSpec::number("total_alunos").required())
        .field(FieldSpec::number("alunos_pcd"))
        .field(FieldSpec::number("alunos_rural"))
        .field(FieldSpec::number("alunos_urbana"))
        .field(
            FieldSpec::choice(
                "muro_cerca",
                &["Sim, muro", "Sim, cerca", "Sim, ambos", "Não possui"],
            )
            .required(),
        )
        .field(
            FieldSpec::choice("perimetro_fechado", &["Sim, totalmente", "Parcialmente", "Não"])
                .required(),
        )
        .field(
            FieldSpec::choice(
                "situacao_estrutura",
                &[
                    "Necessita de reforma geral",
                    "Necessita de reforma parcial (melhoria pontual)",
                    "Reforma em andamento",
                    "Está em reforma, porém a obra está parada",
                    "Foi reformada recentemente",
                ],
            )
            .required(),
        )
        .field(FieldSpec::text("data_ultima_reforma"))
        .field(FieldSpec::multi_choice(
            "ambientes",
            &[
                "Biblioteca",
                "Laboratório de Ciências",
                "Laboratório de Informática",
                "Quadra Esportiva",
                "Refeitório",
                "Cozinha",
                "Sala dos Professores",
                "Auditório",
                "Secretaria",
                "Sala de leitura",
                "SAEE",
                "Sala de reunião",
            ],
        ))
        .field(FieldSpec::choice("quadra_coberta", YES_NO))
        .field(FieldSpec::number("qtd_quadras"))
        .field(FieldSpec::choice("banda_fanfarra", YES_NO).required())
        .field(FieldSpec::number("banheiros_alunos").required())
        .field(FieldSpec::number("banheiros_prof").required())
        .field(FieldSpec::number("banheiros_chuveiro").required())
        .field(
            FieldSpec::choice("banheiros_vasos_funcionais", &["Todos", "Alguns", "Nenhum"])
                .required(),
        )
        .field(FieldSpec::number("salas_climatizadas").required())
        .field(
            FieldSpec::choice(
                "energia",
                &["Concessionária - Equatorial", "Geração própria", "Outro"],
            )
            .required(),
        )
        .field(FieldSpec::choice("transformador", YES_NO).required())
        .field(FieldSpec::choice("rede_eletrica_atende", YES_PARTIAL_NO).required())
        .field(FieldSpec::multi_choice(
            "problemas_eletricos",
            &[
                "Quedas frequentes",
                "Sobrecarga",
                "Fiação antiga",
                "Quadro elétrico inadequado",
                "Não há problemas aparentes",
            ],
        ))
        .field(
            FieldSpec::choice(
                "estrutura_climatizacao",
                &[
                    "Sim",
                    "Não, somente com adequações",
                    "Não, todas as salas são climatizadas",
                ],
            )
            .required(),
        )
        .field(FieldSpec::choice("suporta_novos_equipamentos", YES_PARTIAL_NO).required())
        .field(
            FieldSpec::choice(
                "cameras_funcionamento",
                &["Sim, funcionando plenamente", "Sim, parcialmente", "Não possui"],
            )
            .required(),
        )
        .field(FieldSpec::choice("cameras_cobrem", YES_PARTIAL_NO))
        .group(FieldGroup::new("turno_manha", &["turmas_manha"]).requires(Shift::Morning))
        .group(FieldGroup::new("turno_tarde", &["turmas_tarde"]).requires(Shift::Afternoon))
        .group(FieldGroup::new("turno_noite", &["turmas_noite"]).requires(Shift::Night))
        .build()?;

    let rules = RuleTable::new()
        .with(ComplementaryRule::new("alunos_rural", "alunos_urbana", "total_alunos"))
        .with(when_yes("possui_anexos", &["qtd_anexos", "tipo_predio_anexo"]))
        .with(ClearRule::new(
            "ambientes",
            Predicate::contains("Quadra Esportiva"),
            &["quadra_coberta", "qtd_quadras"],
        ));
    Ok((schema, rules))
}

fn food() -> Result<Section, SnapshotError> {
    let schema = builder("food", "Merenda Escolar")?
        .field(FieldSpec::choice("condicoes_cozinha", &["Boa", "Regular", "Precária"]).required())
        .field(FieldSpec::choice("tamanho_cozinha", &["Pequena", "Média", "Grande"]).required())
        .field(FieldSpec::choice("oferta_regular", &["Sim", "Sim, com falhas", "Não"]).required())
        .field(FieldSpec::choice("qualidade_merenda", &["Sim", "Regular", "Ruim"]).required())
        .field(FieldSpec::choice("atende_necessidades", YES_PARTIAL_NO).required())
        .field(FieldSpec::choice("possui_refeitorio", YES_NO).required())
        .field(FieldSpec::choice("refeitorio_adequado", YES_NO))
        .field(FieldSpec::choice("possui_balanca", YES_NO))
        .field(FieldSpec::number("qtd_freezers").required())
        .field(FieldSpec::choice("estado_freezers", EQUIPMENT_STATE))
        .field(FieldSpec::number("qtd_geladeiras").required())
        .field(FieldSpec::choice("estado_geladeiras", EQUIPMENT_STATE))
        .field(FieldSpec::number("qtd_fogoes").required())
        .field(FieldSpec::choice("estado_fogoes", EQUIPMENT_STATE))
        .field(FieldSpec::number("qtd_fornos").required())
        .field(FieldSpec::choice("estado_fornos", EQUIPMENT_STATE))
        .field(FieldSpec::number("qtd_bebedouros").required())
        .field(FieldSpec::choice("estado_bebedouros", EQUIPMENT_STATE))
        .field(FieldSpec::choice("bancadas_inox", YES_NO))
        .field(FieldSpec::choice("sistema_exaustao", YES_NO))
        .field(FieldSpec::choice("despensa_exclusiva", YES_NO))
        .field(FieldSpec::choice("deposito_conserva", YES_PARTIAL_NO))
        .field(FieldSpec::choice("estoque_epi_extintor", &["Completo", "Parcial", "Inexistente"]))
        .field(FieldSpec::choice(
            "manutencao_extintores",
            &["Está na validade", "Validade vencida"],
        ))
        .field(FieldSpec::number("qtd_merendeiras_estatutaria").required())
        .field(FieldSpec::number("qtd_merendeiras_terceirizada").required())
        .field(FieldSpec::number("qtd_merendeiras_temporaria").required())
        .field(FieldSpec::choice("qtd_atende_necessidade_merenda", YES_NO).required())
        .field(FieldSpec::text("empresa_terceirizada_merenda"))
        .field(FieldSpec::choice("possui_supervisor_merenda", YES_NO))
        .field(FieldSpec::text("nome_supervisor_merenda"))
        .field(FieldSpec::text("contato_supervisor_merenda"))
        .build()?;

    let rules = RuleTable::new()
        .with(when_yes("possui_refeitorio", &["refeitorio_adequado"]))
        .with(when_yes(
            "possui_supervisor_merenda",
            &["nome_supervisor_merenda", "contato_supervisor_merenda"],
        ));
    Ok((schema, rules))
}

fn cleaning() -> Result<Section, SnapshotError> {
    let schema = builder("cleaning", "Serviços Gerais")?
        .field(FieldSpec::number("qtd_servicos_gerais_efetivo").required())
        .field(FieldSpec::number("qtd_servicos_gerais_temporario").required())
        .field(FieldSpec::number("qtd_servicos_gerais_terceirizado").required())
        .field(FieldSpec::choice("qtd_atende_necessidade_sg", YES_NO).required())
        .field(FieldSpec::number("quantitativo_necessario_sg"))
        .field(FieldSpec::text("empresa_terceirizada_sg"))
        .field(FieldSpec::choice("possui_supervisor_sg", YES_NO))
        .field(FieldSpec::text("nome_supervisor_sg"))
        .field(FieldSpec::text("contato_supervisor_sg"))
        .build()?;

    let rules = RuleTable::new()
        .with(when_no("qtd_atende_necessidade_sg", &["quantitativo_necessario_sg"]))
        .with(when_yes(
            "possui_supervisor_sg",
            &["nome_supervisor_sg", "contato_supervisor_sg"],
        ));
    Ok((schema, rules))
}

fn security() -> Result<Section, SnapshotError> {
    let schema = builder("security", "Portaria")?
        .field(FieldSpec::choice("possui_guarita", YES_NO).required())
        .field(FieldSpec::choice("possui_botao_panico", YES_NO))
        .field(FieldSpec::choice("controle_portao", &["Manual", "Fechadura", "Eletrônica"]))
        .field(FieldSpec::choice(
            "iluminacao_externa",
            &["Adequada", "Regular", "Insuficiente"],
        ))
        .field(FieldSpec::number("qtd_agentes_portaria").required())
        .field(FieldSpec::choice("qtd_atende_necessidade_portaria", YES_NO).required())
        .field(FieldSpec::number("quantitativo_necessario_portaria"))
        .field(FieldSpec::text("empresa_terceirizada_portaria"))
        .field(FieldSpec::choice("possui_supervisor_portaria", YES_NO))
        .field(FieldSpec::text("nome_supervisor_portaria"))
        .field(FieldSpec::text("contato_supervisor_portaria"))
        .build()?;

    let rules = RuleTable::new()
        .with(when_no(
            "qtd_atende_necessidade_portaria",
            &["quantitativo_necessario_portaria"],
        ))
        .with(when_yes(
            "possui_supervisor_portaria",
            &["nome_supervisor_portaria", "contato_supervisor_portaria"],
        ));
    Ok((schema, rules))
}

fn tech() -> Result<Section, SnapshotError> {
    let schema = builder("tech", "Equipamentos e Tecnologia")?
        .field(FieldSpec::choice("internet_disponivel", YES_NO).required())
        .field(FieldSpec::choice("provedor_internet", &["Prodepa", "Starlink", "Outro"]))
        .field(FieldSpec::choice(
            "qualidade_internet",
            &[
                "A internet não funciona ou está indisponível com frequência",
                "A internet apresenta lentidão frequente e compromete as atividades",
                "A internet possui velocidade aceitável, com eventuais oscilações",
                "A internet é estável e atende plenamente às necessidades da escola",
                "Não sei avaliar",
                "Não se aplica",
            ],
        ))
        .field(FieldSpec::number("qtd_desktop_adm"))
        .field(FieldSpec::number("qtd_desktop_alunos"))
        .field(FieldSpec::number("qtd_notebooks"))
        .field(FieldSpec::number("qtd_chromebooks"))
        .field(FieldSpec::choice("computadores_atendem", YES_PARTIAL_NO).required())
        .field(FieldSpec::number("qtd_computadores_inoperantes"))
        .field(FieldSpec::choice("possui_projetor", YES_NO).required())
        .field(FieldSpec::number("qtd_projetores"))
        .field(FieldSpec::choice("possui_lousa_digital", YES_NO).required())
        .build()?;

    let rules = RuleTable::new()
        .with(when_yes(
            "internet_disponivel",
            &["provedor_internet", "qualidade_internet"],
        ))
        .with(when_yes("possui_projetor", &["qtd_projetores"]));
    Ok((schema, rules))
}

fn staff() -> Result<Section, SnapshotError> {
    let schema = builder("staff", "Servidores")?
        .field(FieldSpec::choice("possui_direcao", YES_NO).required())
        .field(FieldSpec::choice("possui_vice_pedagogico", YES_NO).required())
        .field(FieldSpec::choice("possui_vice_administrativo", YES_NO).required())
        .field(FieldSpec::choice("possui_secretario", YES_NO).required())
        .field(FieldSpec::choice("possui_coord_pedagogico", YES_NO).required())
        .field(FieldSpec::number("qtd_coord_pedagogico"))
        .field(FieldSpec::choice("possui_coord_area_matematica", YES_NO).required())
        .field(FieldSpec::choice("possui_coord_area_linguagem", YES_NO).required())
        .field(FieldSpec::choice("possui_coord_area_humanas", YES_NO).required())
        .field(FieldSpec::choice("possui_coord_area_natureza", YES_NO).required())
        .field(FieldSpec::number("qtd_professores_efetivos"))
        .field(FieldSpec::number("qtd_professores_temporarios"))
        .field(FieldSpec::number("qtd_servidores_administrativos"))
        .field(FieldSpec::choice("possui_professor_readaptado", YES_NO).required())
        .field(FieldSpec::number("qtd_professor_readaptado"))
        .build()?;

    let rules = RuleTable::new()
        .with(when_yes("possui_coord_pedagogico", &["qtd_coord_pedagogico"]))
        .with(when_yes(
            "possui_professor_readaptado",
            &["qtd_professor_readaptado"],
        ));
    Ok((schema, rules))
}

fn students() -> Result<Section, SnapshotError> {
    let schema = builder("students", "Perfil dos Alunos")?
        .field(FieldSpec::number("total_beneficiarios").required())
        .field(FieldSpec::number("taxa_abandono").required())
        .field(FieldSpec::number("taxa_reprovacao_fund1").required())
        .field(FieldSpec::number("taxa_reprovacao_fund2").required())
        .field(FieldSpec::number("taxa_reprovacao_medio").required())
        .field(FieldSpec::number("ideb_anos_iniciais"))
        .field(FieldSpec::number("ideb_anos_finais"))
        .field(FieldSpec::number("ideb_ensino_medio"))
        .build()?;
    Ok((schema, RuleTable::new()))
}

fn management() -> Result<Section, SnapshotError> {
    let schema = builder("management", "Gestão e Política")?
        .field(FieldSpec::choice("regularizada_cee", YES_NO).required())
        .field(FieldSpec::choice("conselho_escolar", YES_NO).required())
        .field(FieldSpec::choice("conselho_ativo", YES_PARTIAL_NO))
        .field(
            FieldSpec::choice("recursos_prodep", &["Sim", "Não", "Não sabe informar"]).required(),
        )
        .field(FieldSpec::number("valor_prodep"))
        .field(FieldSpec::choice("execucao_prodep", EXECUTION))
        .field(FieldSpec::choice("pendencias_prodep", PENDING))
        .field(FieldSpec::choice("recursos_federais", YES_NO).required())
        .field(FieldSpec::number("valor_federais"))
        .field(FieldSpec::choice("execucao_federais", EXECUTION))
        .field(FieldSpec::choice("pendencias_federais", PENDING))
        .field(FieldSpec::choice("gremio_estudantil", YES_NO).required())
        .field(
            FieldSpec::choice(
                "reunioes_comunidade",
                &[
                    "Não ocorrem",
                    "Eventuais (1–2 por ano)",
                    "Regulares (semestrais)",
                    "Frequentes (mensais ou mais)",
                ],
            )
            .required(),
        )
        .field(FieldSpec::choice("plano_evacuacao", YES_NO).required())
        .field(
            FieldSpec::choice(
                "politica_bullying",
                &[
                    "Sim, formalizada e aplicada",
                    "Parcialmente (ações pontuais)",
                    "Não possui",
                ],
            )
            .required(),
        )
        .build()?;

    let rules = RuleTable::new()
        .with(when_yes("conselho_escolar", &["conselho_ativo"]))
        .with(when_yes(
            "recursos_prodep",
            &["valor_prodep", "execucao_prodep", "pendencias_prodep"],
        ))
        .with(when_yes(
            "recursos_federais",
            &["valor_federais", "execucao_federais", "pendencias_federais"],
        ));
    Ok((schema, rules))
}

fn rating() -> Result<Section, SnapshotError> {
    let schema = builder("rating", "Avaliação e Notas")?
        .field(FieldSpec::choice("avaliacao_merendeiras", RATING).required())
        .field(FieldSpec::choice("avaliacao_portaria", RATING).required())
        .field(FieldSpec::choice("avaliacao_limpeza", RATING).required())
        .field(FieldSpec::choice("avaliacao_comunicacao", RATING).required())
        .field(FieldSpec::choice("avaliacao_supervisao", RATING).required())
        .build()?;
    Ok((schema, RuleTable::new()))
}

fn observations() -> Result<Section, SnapshotError> {
    let schema = builder("observations", "Observações Finais")?
        .field(FieldSpec::text("prioridade_1").required())
        .field(FieldSpec::text("prioridade_2").required())
        .field(FieldSpec::text("prioridade_3").required())
        .field(FieldSpec::choice("demanda_urgente", YES_NO).required())
        .field(FieldSpec::text("descricao_urgencia"))
        .field(FieldSpec::choice("sugestao_melhoria", YES_NO).required())
        .field(FieldSpec::text("descricao_sugestao"))
        .field(FieldSpec::text("nome_responsavel").required())
        .field(FieldSpec::text("cargo_funcao").required())
        .field(FieldSpec::text("matricula_funcional"))
        .field(FieldSpec::flag("declaracao_verdadeira").required())
        .build()?;

    let rules = RuleTable::new()
        .with(when_yes("demanda_urgente", &["descricao_urgencia"]))
        .with(when_yes("sugestao_melhoria", &["descricao_sugestao"]));
    Ok((schema, rules))
}
