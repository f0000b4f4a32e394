//! Sample notes inserted into freshly created databases.

use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

const WELCOME_NOTES: &[(&str, &str)] = &[
    ("Nota de Boas-Vindas", "Esta é sua primeira nota!"),
    ("Como Usar", "Toque no botão '+' para criar uma nova nota."),
    ("Lembrete Importante", "Não esquecer a reunião às 10h amanhã."),
    (
        "Ideias de Projeto",
        "Discutir a nova interface de usuário com a equipe de design.",
    ),
    ("Lista de Compras", "Leite, pão, ovos, café e frutas."),
    (
        "Configuração do Servidor",
        "Verificar credenciais SSH para o novo servidor de produção.",
    ),
    (
        "Feedback do Cliente",
        "O cliente X gostou do recurso A, mas relatou um bug no recurso B.",
    ),
    (
        "Anotação de Aula",
        "Revisar conceitos de arquitetura MVVM para o próximo módulo.",
    ),
    (
        "Plano de Treino",
        "Segunda: Peito/Tríceps, Quarta: Costas/Bíceps, Sexta: Pernas/Ombro.",
    ),
    (
        "Contato Novo",
        "Nome: João Silva, Telefone: (11) 98765-4321, Email: joao@exemplo.com.",
    ),
    (
        "Receita de Bolo",
        "2 xícaras de farinha, 1 xícara de açúcar, 3 ovos, 1/2 xícara de leite, 1 colher de fermento.",
    ),
    (
        "Metas da Semana",
        "Finalizar a documentação técnica e enviar o relatório de progresso.",
    ),
    ("Livros para Ler", "Clean Code, The Pragmatic Programmer, Design Patterns."),
    ("Manutenção do Carro", "Trocar óleo e filtro de ar no próximo mês."),
    (
        "Lembrete de Aniversário",
        "Aniversário da Maria na próxima terça-feira. Comprar presente.",
    ),
    ("Código de Desconto", "Cupom de 20% para a loja online: DESC20OFF."),
    (
        "Progresso do App",
        "Módulo de autenticação concluído e testado com sucesso.",
    ),
    (
        "Ideia de Viagem",
        "Pesquisar pacotes de viagem para Porto de Galinhas em Março.",
    ),
    ("Reunião de Equipe", "Agendada para 15h na sala 3. Tópicos: Sprint Review."),
    ("Exercício Físico", "Fazer 30 minutos de cardio hoje após o trabalho."),
    ("Tarefa Doméstica", "Lavar a louça e estender a roupa antes de dormir."),
    (
        "Planejamento Financeiro",
        "Revisar o orçamento mensal e ajustar gastos com lazer.",
    ),
];

/// Inserts the sample notes, all stamped with `timestamp`. Returns the
/// number of notes written.
pub(crate) fn seed_welcome_notes(conn: &Connection, timestamp: i64) -> RepoResult<usize> {
    let repo = SqliteNoteRepository::new(conn);
    for (title, content) in WELCOME_NOTES {
        repo.insert_note(title, content, timestamp)?;
    }
    Ok(WELCOME_NOTES.len())
}
